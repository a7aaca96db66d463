//! Conversation list shown on the messages tab

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::core::{Action, Context, Module, Signal};
use crate::domain::{format_age, ConversationSummary};

#[derive(Debug, Default)]
pub struct InboxPanel {
    conversations: Vec<ConversationSummary>,
    selected: usize,
    unread: u32,
    loaded: bool,
}

impl InboxPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn unread(&self) -> u32 {
        self.unread
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&ConversationSummary> {
        self.conversations.get(self.selected)
    }

    pub fn find(&self, conversation_id: &str) -> Option<&ConversationSummary> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    /// Replace the list, keeping the cursor on the same conversation
    pub fn apply(&mut self, conversations: Vec<ConversationSummary>, unread: u32) {
        let keep = self.selected().map(|c| c.id.clone());
        self.conversations = conversations;
        self.unread = unread;
        self.loaded = true;
        self.selected = keep
            .and_then(|id| self.conversations.iter().position(|c| c.id == id))
            .unwrap_or(0)
            .min(self.conversations.len().saturating_sub(1));
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.conversations.len() {
            self.selected += 1;
        }
    }
}

impl Module for InboxPanel {
    fn id(&self) -> &'static str {
        "inbox"
    }

    fn handle_key(&mut self, key: KeyEvent, _ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_up();
                Action::None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_down();
                Action::None
            }
            KeyCode::Enter => match self.selected() {
                Some(conversation) => Action::Emit(Signal::OpenChat {
                    conversation_id: conversation.id.clone(),
                    participant: conversation.other_participant.clone(),
                }),
                None => Action::None,
            },
            _ => Action::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let title = match self.unread {
            0 => "CONVERSATIONS".to_string(),
            n => format!("CONVERSATIONS ({n} unread)"),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan));

        if self.conversations.is_empty() {
            let text = if self.loaded {
                "No conversations yet"
            } else {
                "Loading conversations…"
            };
            frame.render_widget(Paragraph::new(text).block(block), area);
            return;
        }

        let now = Utc::now();
        let items: Vec<ListItem> = self
            .conversations
            .iter()
            .map(|conversation| conversation_item(conversation, ctx, now))
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("› ");
        let mut state = ListState::default();
        state.select(Some(self.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn conversation_item<'a>(
    conversation: &'a ConversationSummary,
    ctx: &Context,
    now: chrono::DateTime<Utc>,
) -> ListItem<'a> {
    let name_style = if conversation.unread_count > 0 {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut header = vec![
        Span::styled(conversation.other_participant.name.as_str(), name_style),
        Span::styled(
            format!("  {}", conversation.other_participant.role.label()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if conversation.unread_count > 0 {
        header.push(Span::styled(
            format!("  ●{}", conversation.unread_count),
            Style::default().fg(Color::LightRed),
        ));
    }

    let preview = match &conversation.last_message {
        Some(last) => {
            let prefix = if ctx.is_me(&last.sender_id) { "you: " } else { "" };
            Line::from(vec![
                Span::styled(
                    format!("{:>4} ", format_age(last.timestamp, now)),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(format!("{prefix}{}", last.content)),
            ])
        }
        None => Line::from(Span::styled(
            "     no messages",
            Style::default().fg(Color::DarkGray),
        )),
    };

    ListItem::new(vec![Line::from(header), preview])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Participant, Role};
    use crossterm::event::KeyModifiers;

    fn convo(id: &str, unread: u32) -> ConversationSummary {
        ConversationSummary {
            id: id.to_string(),
            other_participant: Participant {
                name: format!("name-{id}"),
                role: Role::Driver,
            },
            last_message: None,
            unread_count: unread,
        }
    }

    #[test]
    fn test_selection_follows_conversation() {
        let mut inbox = InboxPanel::new();
        inbox.apply(vec![convo("a", 0), convo("b", 1), convo("c", 0)], 1);
        inbox.move_down();
        assert_eq!(inbox.selected().map(|c| c.id.as_str()), Some("b"));

        // "b" moved to the top after a new message
        inbox.apply(vec![convo("b", 2), convo("a", 0), convo("c", 0)], 2);
        assert_eq!(inbox.selected_index(), 0);
        assert_eq!(inbox.unread(), 2);

        inbox.apply(vec![convo("z", 0)], 0);
        assert_eq!(inbox.selected_index(), 0);
    }

    #[test]
    fn test_enter_emits_open_chat() {
        let mut inbox = InboxPanel::new();
        let mut ctx = Context::default();
        inbox.apply(vec![convo("a", 3)], 3);

        let action = inbox.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &mut ctx);
        match action {
            Action::Emit(Signal::OpenChat {
                conversation_id,
                participant,
            }) => {
                assert_eq!(conversation_id, "a");
                assert_eq!(participant.name, "name-a");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_enter_on_empty_list() {
        let mut inbox = InboxPanel::new();
        let mut ctx = Context::default();
        let action = inbox.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &mut ctx);
        assert!(matches!(action, Action::None));
    }
}
