use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::NotificationPermission;
use crate::core::{
    parse_command, Action, Command, Context, EventBus, Identity, NotifyLevel, Signal, SignalKind,
    Subscription,
};
use crate::domain::Participant;
use crate::infrastructure::runtime::{RuntimeCommand, RuntimeEvent, SyncState};
use crate::modules::chat::ChatPanel;
use crate::modules::dashboard::{Dashboard, OverviewData};
use crate::modules::inbox::InboxPanel;
use crate::modules::notifications::{Notifier, NotifyOutcome};
use crate::modules::offers::OffersPanel;

const STATUS_TTL: Duration = Duration::from_secs(3);

/// Main tabs in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Overview,
    Offers,
    Messages,
    Profile,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Overview, Tab::Offers, Tab::Messages, Tab::Profile];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Offers => "Offers",
            Tab::Messages => "Messages",
            Tab::Profile => "Profile",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Tab::Overview => '1',
            Tab::Offers => '2',
            Tab::Messages => '3',
            Tab::Profile => '4',
        }
    }

    /// Tab from a user-typed name, English or French
    pub fn from_name(name: &str) -> Option<Tab> {
        match name.trim().to_lowercase().as_str() {
            "overview" | "home" | "accueil" | "dashboard" => Some(Tab::Overview),
            "offers" | "offres" => Some(Tab::Offers),
            "messages" | "inbox" | "messagerie" => Some(Tab::Messages),
            "profile" | "profil" => Some(Tab::Profile),
            _ => None,
        }
    }

    pub fn from_shortcut(ch: char) -> Option<Tab> {
        Tab::ALL.into_iter().find(|tab| tab.shortcut() == ch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
    Prompt(PromptKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// y/n answer to the notification consent question
    NotificationPermission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Warn => StatusLevel::Warn,
            NotifyLevel::Error => StatusLevel::Error,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// Dashboard shell state, owned by the UI thread
pub struct App {
    pub ctx: Context,
    pub bus: EventBus,
    /// Navigation signals waiting to be applied
    mailbox: Rc<RefCell<VecDeque<Signal>>>,
    _navigation: Subscription,

    pub current_tab: Tab,
    pub dashboard: Dashboard,
    pub inbox: InboxPanel,
    pub chat: Option<ChatPanel>,
    pub offers: OffersPanel,
    pub notifier: Notifier,

    pub sync_state: SyncState,
    pub last_sync_error: Option<String>,
    pub api_url: String,

    pub input_mode: InputMode,
    pub command: CommandBar,
    pub status: Option<StatusMessage>,
    pub help_open: bool,
    pub should_quit: bool,

    pending: Vec<RuntimeCommand>,
}

impl App {
    pub fn new(me: Identity, permission: NotificationPermission, api_url: impl Into<String>) -> Self {
        let bus = EventBus::new();
        let mailbox = Rc::new(RefCell::new(VecDeque::new()));
        let navigation = {
            let mailbox = Rc::clone(&mailbox);
            bus.on_any(&SignalKind::NAVIGATION, move |signal| {
                mailbox.borrow_mut().push_back(signal.clone());
            })
        };

        Self {
            ctx: Context::new(me),
            bus,
            mailbox,
            _navigation: navigation,
            current_tab: Tab::Overview,
            dashboard: Dashboard::new(),
            inbox: InboxPanel::new(),
            chat: None,
            offers: OffersPanel::new(),
            notifier: Notifier::new(permission),
            sync_state: SyncState::Idle,
            last_sync_error: None,
            api_url: api_url.into(),
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            status: None,
            help_open: false,
            should_quit: false,
            pending: Vec::new(),
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
        self.notifier.expire();
        self.offer_permission_prompt();
    }

    /// A form or compose line is taking text input
    pub fn capturing_text(&self) -> bool {
        match self.current_tab {
            Tab::Offers => self.offers.form_open(),
            Tab::Messages => self.chat.as_ref().is_some_and(|chat| chat.is_composing()),
            Tab::Overview | Tab::Profile => false,
        }
    }

    /// Show the pending consent question once the user is not typing, so
    /// keystrokes meant for a form never answer it
    fn offer_permission_prompt(&mut self) {
        if self.notifier.awaiting_permission()
            && self.input_mode == InputMode::Normal
            && !self.help_open
            && !self.capturing_text()
        {
            self.input_mode = InputMode::Prompt(PromptKind::NotificationPermission);
        }
    }

    /// Commands for the sync worker queued since the last call
    pub fn take_runtime_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.pending)
    }

    fn queue(&mut self, cmd: RuntimeCommand) {
        self.pending.push(cmd);
    }

    /// Publish a signal and apply whatever navigation it caused
    pub fn emit(&mut self, signal: Signal) {
        self.bus.dispatch(signal);
        self.pump_signals();
    }

    /// Apply navigation signals received from the bus, in arrival order
    pub fn pump_signals(&mut self) {
        loop {
            let next = self.mailbox.borrow_mut().pop_front();
            let Some(signal) = next else {
                break;
            };
            self.apply_signal(signal);
        }
    }

    fn apply_signal(&mut self, signal: Signal) {
        debug!(signal = signal.kind().name(), "navigation");
        match signal {
            Signal::ChangeTab { tab, open_create } => {
                self.set_tab(tab);
                if open_create && tab == Tab::Offers {
                    self.open_offer_form();
                }
            }
            Signal::OpenCreateOffer => {
                self.set_tab(Tab::Offers);
                self.open_offer_form();
            }
            Signal::OpenChat {
                conversation_id,
                participant,
            } => {
                self.set_tab(Tab::Messages);
                self.open_chat(conversation_id, participant);
            }
            Signal::OpenMessages => self.set_tab(Tab::Messages),
            _ => {}
        }
    }

    /// Only employers and admins get the form; everyone else a notice
    fn open_offer_form(&mut self) {
        if self.ctx.me.role.can_publish_offers() {
            self.offers.open_form();
        } else {
            self.set_status("Only employers can publish offers", StatusLevel::Warn);
        }
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
        self.ctx.active_tab = tab;
        if tab == Tab::Offers && !self.offers.is_loaded() {
            self.queue(RuntimeCommand::LoadOffers { force: false });
        }
    }

    fn open_chat(&mut self, conversation_id: String, participant: Participant) {
        let already_open = self
            .chat
            .as_ref()
            .is_some_and(|chat| chat.conversation_id() == conversation_id);
        if !already_open {
            self.chat = Some(ChatPanel::new(conversation_id.clone(), participant));
            self.queue(RuntimeCommand::WatchConversation {
                conversation_id: Some(conversation_id.clone()),
            });
        }
        let unread = self
            .inbox
            .find(&conversation_id)
            .map(|c| c.unread_count)
            .unwrap_or(0);
        if unread > 0 {
            self.queue(RuntimeCommand::MarkRead { conversation_id });
        }
    }

    pub fn close_chat(&mut self) {
        if self.chat.take().is_some() {
            self.queue(RuntimeCommand::WatchConversation {
                conversation_id: None,
            });
        }
    }

    /// User-initiated refresh of whatever the current tab shows
    pub fn refresh(&mut self) {
        self.emit(Signal::ForceRefresh);
        if self.current_tab == Tab::Offers {
            self.queue(RuntimeCommand::LoadOffers { force: true });
        }
        self.set_status("Refreshing…", StatusLevel::Info);
    }

    pub fn overview(&self) -> OverviewData {
        OverviewData {
            unread: self.inbox.unread(),
            recent: self.inbox.conversations().to_vec(),
            offers: self.offers.is_loaded().then(|| self.offers.offers().len()),
            sync: Some(self.sync_state),
            last_error: self.last_sync_error.clone(),
            api_url: self.api_url.clone(),
        }
    }

    /// Push derived state into panels before drawing
    pub fn sync_context(&mut self) {
        self.ctx.unread = self.inbox.unread();
        let overview = self.overview();
        self.dashboard.update(overview);
    }

    pub fn apply_runtime_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::SyncState { state } => {
                self.sync_state = state;
                if state == SyncState::Ready {
                    self.last_sync_error = None;
                }
            }
            RuntimeEvent::ConversationsReady {
                conversations,
                unread,
            } => {
                self.inbox.apply(conversations, unread);
                self.ctx.unread = unread;
            }
            RuntimeEvent::UnreadIncreased { previous, current } => {
                info!(previous, current, "unread increased");
                if self.notifier.on_unread_increase(current) == NotifyOutcome::PermissionRequested {
                    self.offer_permission_prompt();
                }
            }
            RuntimeEvent::SyncFailed { message } => {
                self.set_status(
                    format!("Sync failed, showing last known data: {message}"),
                    StatusLevel::Warn,
                );
                self.last_sync_error = Some(message);
            }
            RuntimeEvent::MessagesReady {
                conversation_id,
                messages,
            } => {
                let Some(chat) = self.chat.as_mut() else {
                    return;
                };
                if chat.conversation_id() != conversation_id {
                    return;
                }
                let fresh = chat.apply_messages(messages, &self.ctx);
                if fresh > 0 {
                    self.emit(Signal::MessageReceived {
                        conversation_id: conversation_id.clone(),
                    });
                    self.queue(RuntimeCommand::MarkRead { conversation_id });
                }
            }
            RuntimeEvent::MessageSent {
                conversation_id,
                message,
            } => {
                if let Some(chat) = self
                    .chat
                    .as_mut()
                    .filter(|chat| chat.conversation_id() == conversation_id)
                {
                    chat.push_sent(message);
                }
                self.emit(Signal::MessageSent { conversation_id });
            }
            RuntimeEvent::MessageFailed {
                conversation_id,
                content,
                error,
            } => {
                if let Some(chat) = self
                    .chat
                    .as_mut()
                    .filter(|chat| chat.conversation_id() == conversation_id)
                {
                    chat.restore_draft(content);
                }
                self.set_status(format!("Message not sent: {error}"), StatusLevel::Error);
            }
            RuntimeEvent::ConversationRead { conversation_id } => {
                self.emit(Signal::ConversationRead { conversation_id });
            }
            RuntimeEvent::OffersReady { offers, cached } => {
                self.offers.apply(offers, cached);
            }
            RuntimeEvent::OfferCreated { offer } => {
                self.set_status(format!("Offer published: {}", offer.title), StatusLevel::Info);
                self.offers.close_form();
                self.offers.prepend(offer);
            }
            RuntimeEvent::Error { message } => self.set_status(message, StatusLevel::Error),
        }
    }

    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Emit(signal) => self.emit(signal),
            Action::SendMessage {
                conversation_id,
                content,
            } => self.queue(RuntimeCommand::SendMessage {
                conversation_id,
                content,
            }),
            Action::MarkRead(conversation_id) => {
                self.queue(RuntimeCommand::MarkRead { conversation_id })
            }
            Action::CreateOffer(offer) => {
                self.set_status("Publishing offer…", StatusLevel::Info);
                self.queue(RuntimeCommand::CreateOffer { offer });
            }
            Action::Notify(text, level) => self.set_status(text, level.into()),
            Action::CloseOverlay => {
                if self.offers.form_open() {
                    self.offers.close_form();
                } else if self.current_tab == Tab::Messages {
                    self.close_chat();
                }
            }
            Action::Quit => self.should_quit = true,
        }
    }

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
        self.offer_permission_prompt();
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }
        let cmd = parse_command(&input);
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
        self.execute_command(cmd);
        self.command.last = Some(input);
        self.offer_permission_prompt();
    }

    pub fn execute_command(&mut self, cmd: Command) {
        match cmd {
            Command::Tab(tab) => self.emit(Signal::ChangeTab {
                tab,
                open_create: false,
            }),
            Command::Chat(conversation_id) => match self.inbox.find(&conversation_id) {
                Some(conversation) => {
                    let participant = conversation.other_participant.clone();
                    self.emit(Signal::OpenChat {
                        conversation_id,
                        participant,
                    });
                }
                None => self.set_status(
                    format!("Unknown conversation: {conversation_id}"),
                    StatusLevel::Warn,
                ),
            },
            Command::Read(conversation_id) => {
                self.queue(RuntimeCommand::MarkRead { conversation_id })
            }
            Command::Refresh => self.refresh(),
            Command::NewOffer => self.emit(Signal::OpenCreateOffer),
            Command::Offers => {
                self.set_tab(Tab::Offers);
                self.queue(RuntimeCommand::LoadOffers { force: true });
            }
            Command::Help => self.help_open = true,
            Command::Quit => self.should_quit = true,
            Command::Unknown(input) => {
                self.set_status(format!("Unknown command: {input}"), StatusLevel::Warn)
            }
        }
    }

    /// Answer the notification consent prompt
    pub fn answer_permission(&mut self, granted: bool) {
        self.notifier.answer_permission(granted);
        self.input_mode = InputMode::Normal;
        if !granted {
            self.set_status("Notifications disabled", StatusLevel::Info);
        }
    }

    /// Follow the notification banner, if one is showing
    pub fn open_notification(&mut self) -> bool {
        match self.notifier.activate() {
            Some(signal) => {
                self.emit(signal);
                true
            }
            None => false,
        }
    }
}
