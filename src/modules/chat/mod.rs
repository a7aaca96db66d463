//! Chat panel - one conversation with a compose line

use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::core::{Action, Context, Module};
use crate::domain::{Message, Participant};

#[derive(Debug, Clone)]
pub struct ChatPanel {
    conversation_id: String,
    participant: Participant,
    messages: Vec<Message>,
    loaded: bool,
    draft: String,
    composing: bool,
    /// Lines scrolled up from the bottom
    scroll: u16,
}

impl ChatPanel {
    pub fn new(conversation_id: impl Into<String>, participant: Participant) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            participant,
            messages: Vec::new(),
            loaded: false,
            draft: String::new(),
            composing: false,
            scroll: 0,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub fn start_compose(&mut self) {
        self.composing = true;
    }

    /// Replace the history; returns how many incoming messages were not
    /// present in the previous load. The first load counts as zero.
    pub fn apply_messages(&mut self, messages: Vec<Message>, ctx: &Context) -> usize {
        let fresh = if self.loaded {
            let known: HashSet<&str> = self.messages.iter().map(|m| m.id.as_str()).collect();
            messages
                .iter()
                .filter(|m| !ctx.is_me(&m.sender_id) && !known.contains(m.id.as_str()))
                .count()
        } else {
            0
        };
        self.messages = messages;
        self.loaded = true;
        fresh
    }

    /// Append a message the server accepted, unless a poll already brought it
    pub fn push_sent(&mut self, message: Message) {
        if !self.messages.iter().any(|m| m.id == message.id) {
            self.messages.push(message);
        }
        self.scroll = 0;
    }

    /// Put a rejected message back into the compose line
    pub fn restore_draft(&mut self, content: String) {
        if self.draft.is_empty() {
            self.draft = content;
        }
        self.composing = true;
    }

    fn handle_compose_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.composing = false;
                Action::None
            }
            KeyCode::Enter => {
                let content = self.draft.trim().to_string();
                if content.is_empty() {
                    return Action::None;
                }
                self.draft.clear();
                Action::SendMessage {
                    conversation_id: self.conversation_id.clone(),
                    content,
                }
            }
            KeyCode::Backspace => {
                self.draft.pop();
                Action::None
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.draft.push(ch);
                Action::None
            }
            _ => Action::None,
        }
    }
}

impl Module for ChatPanel {
    fn id(&self) -> &'static str {
        "chat"
    }

    fn handle_key(&mut self, key: KeyEvent, _ctx: &mut Context) -> Action {
        if self.composing {
            return self.handle_compose_key(key);
        }
        match key.code {
            KeyCode::Char('i') => {
                self.composing = true;
                Action::None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll = self.scroll.saturating_add(1);
                Action::None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            KeyCode::Esc => Action::CloseOverlay,
            _ => Action::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(area);

        let title = format!(
            "{} · {}",
            self.participant.name,
            self.participant.role.label()
        );
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan));

        let lines: Vec<Line> = if !self.loaded {
            vec![Line::from("Loading messages…")]
        } else if self.messages.is_empty() {
            vec![Line::from(Span::styled(
                "No messages yet. Press i to write.",
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.messages
                .iter()
                .map(|message| message_line(message, ctx))
                .collect()
        };

        let visible = chunks[0].height.saturating_sub(2);
        let bottom = (lines.len() as u16).saturating_sub(visible);
        let offset = bottom.saturating_sub(self.scroll);
        let history = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((offset, 0));
        frame.render_widget(history, chunks[0]);

        let (compose_title, border) = if self.composing {
            ("Message (Enter send · Esc stop)", Color::Yellow)
        } else {
            ("i to write · Esc back", Color::DarkGray)
        };
        let compose = Paragraph::new(self.draft.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(compose_title)
                .border_style(Style::default().fg(border)),
        );
        frame.render_widget(compose, chunks[1]);
    }
}

fn message_line<'a>(message: &'a Message, ctx: &Context) -> Line<'a> {
    let time = message.timestamp.format("%H:%M").to_string();
    let (who, style) = if ctx.is_me(&message.sender_id) {
        ("you", Style::default().fg(Color::LightGreen))
    } else {
        ("them", Style::default().fg(Color::LightBlue))
    };
    let mut spans = vec![
        Span::styled(format!("{time} "), Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{who:>4} "), style.add_modifier(Modifier::BOLD)),
        Span::raw(message.content.as_str()),
    ];
    if !ctx.is_me(&message.sender_id) && !message.read {
        spans.push(Span::styled(" •", Style::default().fg(Color::LightRed)));
    }
    Line::from(spans)
}
