//! Async worker - runs in Tokio runtime and keeps the inbox fresh
//!
//! One task owns the conversation tracker and processes interval ticks,
//! debounced refresh deadlines and UI commands one at a time. Fetches never
//! overlap, so the last snapshot applied is the last one requested.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::domain::{LastMessage, NewOffer, Offer};
use crate::infrastructure::api::MarketplaceApi;
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent};
use crate::infrastructure::runtime::scheduler::RefreshScheduler;
use crate::infrastructure::runtime::tracker::{SyncState, UnreadTracker};
use crate::store::cache::{self, SharedCache, DEFAULT_TTL, SWEEP_INTERVAL};

pub const CONVERSATIONS_KEY: &str = "conversations";
pub const OFFERS_KEY: &str = "offers";

/// Worker timing and identity
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Signed-in user, author of optimistic messages
    pub user_id: String,
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub cache_ttl: Duration,
    pub cache_sweep: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            poll_interval: Duration::from_secs(5),
            debounce: Duration::from_millis(200),
            cache_ttl: DEFAULT_TTL,
            cache_sweep: SWEEP_INTERVAL,
        }
    }
}

/// Run the async worker loop until `Shutdown`, a closed command channel or
/// a closed event channel
pub async fn run_async_worker(
    api: Arc<dyn MarketplaceApi>,
    settings: SyncSettings,
    mut cmd_rx: UnboundedReceiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    if settings.poll_interval.is_zero() {
        bail!("poll interval must be greater than zero");
    }
    if settings.cache_sweep.is_zero() {
        bail!("cache sweep interval must be greater than zero");
    }

    let cache = cache::shared::<Value>(settings.cache_ttl);
    let sweeper = cache::spawn_sweeper(cache.clone(), settings.cache_sweep);

    let mut scheduler = RefreshScheduler::new(settings.debounce);
    let mut ticker = interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        poll_ms = settings.poll_interval.as_millis() as u64,
        debounce_ms = settings.debounce.as_millis() as u64,
        "sync worker started"
    );

    let mut worker = SyncWorker {
        api,
        cache,
        evt_tx,
        tracker: UnreadTracker::new(),
        watched: None,
        settings,
        closed: false,
    };

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => match cmd {
                None | Some(RuntimeCommand::Shutdown) => break,
                Some(RuntimeCommand::Trigger(trigger)) => {
                    let deadline = scheduler.schedule(trigger, Instant::now());
                    debug!(
                        ?trigger,
                        in_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
                        "refresh scheduled"
                    );
                }
                Some(cmd) => worker.handle(cmd).await,
            },

            _ = ticker.tick() => worker.poll().await,

            _ = wait_until(scheduler.deadline()) => {
                if scheduler.take_due(Instant::now()) {
                    worker.refresh_conversations().await;
                }
            }
        }

        if worker.closed {
            break;
        }
    }

    sweeper.abort();
    info!("sync worker stopped");
    Ok(())
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

struct SyncWorker {
    api: Arc<dyn MarketplaceApi>,
    cache: SharedCache<Value>,
    evt_tx: Sender<RuntimeEvent>,
    tracker: UnreadTracker,
    watched: Option<String>,
    settings: SyncSettings,
    closed: bool,
}

impl SyncWorker {
    fn emit(&mut self, event: RuntimeEvent) {
        if self.evt_tx.send(event).is_err() && !self.closed {
            debug!("event receiver dropped; stopping");
            self.closed = true;
        }
    }

    fn emit_view(&mut self) {
        let event = RuntimeEvent::ConversationsReady {
            conversations: self.tracker.conversations().to_vec(),
            unread: self.tracker.unread(),
        };
        self.emit(event);
    }

    fn set_state(&mut self, state: SyncState) {
        self.emit(RuntimeEvent::SyncState { state });
    }

    async fn poll(&mut self) {
        self.refresh_conversations().await;
        if let Some(conversation_id) = self.watched.clone() {
            self.load_messages(&conversation_id).await;
        }
    }

    async fn handle(&mut self, cmd: RuntimeCommand) {
        match cmd {
            RuntimeCommand::MarkRead { conversation_id } => self.mark_read(conversation_id).await,
            RuntimeCommand::SendMessage {
                conversation_id,
                content,
            } => self.send_message(conversation_id, content).await,
            RuntimeCommand::WatchConversation { conversation_id } => {
                self.watched = conversation_id.clone();
                if let Some(conversation_id) = conversation_id {
                    self.load_messages(&conversation_id).await;
                }
            }
            RuntimeCommand::LoadMessages { conversation_id } => {
                self.load_messages(&conversation_id).await
            }
            RuntimeCommand::LoadOffers { force } => self.load_offers(force).await,
            RuntimeCommand::CreateOffer { offer } => self.create_offer(offer).await,
            // Handled by the loop
            RuntimeCommand::Trigger(_) | RuntimeCommand::Shutdown => {}
        }
    }

    async fn refresh_conversations(&mut self) {
        self.tracker.begin_fetch();
        self.set_state(SyncState::Loading);
        cache::lock(&self.cache).delete(CONVERSATIONS_KEY);

        match self.api.list_conversations().await {
            Ok(conversations) => {
                if let Err(err) = cache::lock(&self.cache).set_json(
                    CONVERSATIONS_KEY,
                    &conversations,
                    self.settings.cache_ttl,
                ) {
                    warn!(error = %err, "could not cache conversations");
                }
                let change = self.tracker.apply_snapshot(conversations);
                self.set_state(SyncState::Ready);
                self.emit_view();
                if change.increased() {
                    info!(
                        previous = change.previous,
                        current = change.current,
                        "unread messages increased"
                    );
                    self.emit(RuntimeEvent::UnreadIncreased {
                        previous: change.previous,
                        current: change.current,
                    });
                }
            }
            Err(err) => {
                warn!(error = %err, "conversation refresh failed");
                self.tracker.apply_failure(err.to_string());
                self.set_state(SyncState::Error);
                self.emit(RuntimeEvent::SyncFailed {
                    message: err.to_string(),
                });
            }
        }
    }

    async fn mark_read(&mut self, conversation_id: String) {
        let (request, _) = self.tracker.begin_mark_read(&conversation_id);
        self.emit_view();

        match self.api.mark_read(&conversation_id).await {
            Ok(()) => {
                self.tracker.confirm(request, None);
                self.emit_view();
                self.emit(RuntimeEvent::ConversationRead { conversation_id });
            }
            Err(err) => {
                warn!(conversation = %conversation_id, error = %err, "mark read rejected");
                self.tracker.rollback(request);
                self.emit_view();
                self.emit(RuntimeEvent::Error {
                    message: format!("Could not mark conversation read: {err}"),
                });
            }
        }
    }

    async fn send_message(&mut self, conversation_id: String, content: String) {
        let draft = LastMessage {
            content: content.clone(),
            sender_id: self.settings.user_id.clone(),
            timestamp: Utc::now(),
        };
        let (request, _) = self.tracker.begin_send(&conversation_id, draft);
        self.emit_view();

        match self.api.send_message(&conversation_id, &content).await {
            Ok(message) => {
                self.tracker
                    .confirm(request, Some(message.as_last_message()));
                self.emit_view();
                self.emit(RuntimeEvent::MessageSent {
                    conversation_id,
                    message,
                });
            }
            Err(err) => {
                warn!(conversation = %conversation_id, error = %err, "message rejected");
                self.tracker.rollback(request);
                self.emit_view();
                self.emit(RuntimeEvent::MessageFailed {
                    conversation_id,
                    content,
                    error: err.to_string(),
                });
            }
        }
    }

    async fn load_messages(&mut self, conversation_id: &str) {
        match self.api.list_messages(conversation_id).await {
            Ok(messages) => self.emit(RuntimeEvent::MessagesReady {
                conversation_id: conversation_id.to_string(),
                messages,
            }),
            Err(err) => {
                warn!(conversation = %conversation_id, error = %err, "message fetch failed");
                self.emit(RuntimeEvent::Error {
                    message: format!("Messages unavailable: {err}"),
                });
            }
        }
    }

    async fn load_offers(&mut self, force: bool) {
        let cached: Option<Vec<Offer>> = if force {
            cache::lock(&self.cache).delete(OFFERS_KEY);
            None
        } else {
            cache::lock(&self.cache).get_json(OFFERS_KEY)
        };
        if let Some(offers) = cached {
            debug!("offers served from cache");
            self.emit(RuntimeEvent::OffersReady {
                offers,
                cached: true,
            });
            return;
        }

        match self.api.list_offers().await {
            Ok(offers) => {
                if let Err(err) =
                    cache::lock(&self.cache).set_json(OFFERS_KEY, &offers, self.settings.cache_ttl)
                {
                    warn!(error = %err, "could not cache offers");
                }
                self.emit(RuntimeEvent::OffersReady {
                    offers,
                    cached: false,
                });
            }
            Err(err) => {
                warn!(error = %err, "offer fetch failed");
                self.emit(RuntimeEvent::Error {
                    message: format!("Offers unavailable: {err}"),
                });
            }
        }
    }

    async fn create_offer(&mut self, offer: NewOffer) {
        match self.api.create_offer(&offer).await {
            Ok(created) => {
                info!(offer = %created.id, "offer published");
                cache::lock(&self.cache).delete(OFFERS_KEY);
                self.emit(RuntimeEvent::OfferCreated { offer: created });
            }
            Err(err) => {
                warn!(error = %err, "offer creation failed");
                self.emit(RuntimeEvent::Error {
                    message: format!("Offer not published: {err}"),
                });
            }
        }
    }
}
