//! Dashboard module - panel-based overview tab

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::Tab;
use crate::core::{Action, Context, Module, NotifyLevel, Signal};
use crate::domain::{format_age, ConversationSummary};
use crate::infrastructure::runtime::SyncState;

const RECENT_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardPanel {
    Inbox,
    Offers,
    Sync,
}

/// What the overview shows, refreshed by the app before each frame
#[derive(Debug, Clone, Default)]
pub struct OverviewData {
    pub unread: u32,
    pub recent: Vec<ConversationSummary>,
    pub offers: Option<usize>,
    pub sync: Option<SyncState>,
    pub last_error: Option<String>,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    active_panel: DashboardPanel,
    data: OverviewData,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            active_panel: DashboardPanel::Inbox,
            data: OverviewData::default(),
        }
    }

    pub fn active_panel(&self) -> DashboardPanel {
        self.active_panel
    }

    pub fn update(&mut self, data: OverviewData) {
        self.data = data;
    }

    pub fn next_panel(&mut self) {
        self.active_panel = match self.active_panel {
            DashboardPanel::Inbox => DashboardPanel::Offers,
            DashboardPanel::Offers => DashboardPanel::Sync,
            DashboardPanel::Sync => DashboardPanel::Inbox,
        };
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = match self.active_panel {
            DashboardPanel::Inbox => DashboardPanel::Sync,
            DashboardPanel::Offers => DashboardPanel::Inbox,
            DashboardPanel::Sync => DashboardPanel::Offers,
        };
    }

    fn border_style(&self, panel: DashboardPanel) -> Style {
        if self.active_panel == panel {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }
}

impl Module for Dashboard {
    fn id(&self) -> &'static str {
        "dashboard"
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        match key.code {
            KeyCode::Tab => {
                self.next_panel();
                Action::None
            }
            KeyCode::BackTab => {
                self.prev_panel();
                Action::None
            }
            KeyCode::Enter => match self.active_panel {
                DashboardPanel::Inbox => Action::Emit(Signal::ChangeTab {
                    tab: Tab::Messages,
                    open_create: false,
                }),
                DashboardPanel::Offers => Action::Emit(Signal::ChangeTab {
                    tab: Tab::Offers,
                    open_create: false,
                }),
                DashboardPanel::Sync => Action::Emit(Signal::ForceRefresh),
            },
            KeyCode::Char('c') if !ctx.me.role.can_publish_offers() => Action::Notify(
                "Only employers can publish offers".to_string(),
                NotifyLevel::Warn,
            ),
            KeyCode::Char('c') => Action::Emit(Signal::ChangeTab {
                tab: Tab::Offers,
                open_create: true,
            }),
            _ => Action::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        self.render_inbox_panel(frame, columns[0], ctx);
        self.render_offers_panel(frame, right[0], ctx);
        self.render_sync_panel(frame, right[1]);
    }
}

impl Dashboard {
    fn render_inbox_panel(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("INBOX")
            .border_style(self.border_style(DashboardPanel::Inbox));

        let headline = match self.data.unread {
            0 => Span::styled("All caught up", Style::default().fg(Color::LightGreen)),
            1 => Span::styled(
                "1 unread message",
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ),
            n => Span::styled(
                format!("{n} unread messages"),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ),
        };
        let mut lines = vec![Line::from(headline), Line::from("")];

        let now = Utc::now();
        for conversation in self.data.recent.iter().take(RECENT_ROWS) {
            let (age, preview) = match &conversation.last_message {
                Some(last) => {
                    let prefix = if ctx.is_me(&last.sender_id) { "you: " } else { "" };
                    (
                        format_age(last.timestamp, now),
                        format!("{prefix}{}", last.content),
                    )
                }
                None => (String::new(), String::new()),
            };
            let badge = if conversation.unread_count > 0 {
                format!(" ●{}", conversation.unread_count)
            } else {
                String::new()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{age:>4} "), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    conversation.other_participant.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(badge, Style::default().fg(Color::LightRed)),
                Span::raw(format!("  {preview}")),
            ]));
        }
        if self.data.recent.is_empty() {
            lines.push(Line::from(Span::styled(
                "No conversations yet",
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter open messages",
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_offers_panel(&self, frame: &mut Frame, area: Rect, ctx: &Context) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("OFFERS")
            .border_style(self.border_style(DashboardPanel::Offers));

        let count = match self.data.offers {
            Some(n) => format!("{n} published"),
            None => "not loaded".to_string(),
        };
        let mut lines = vec![Line::from(count), Line::from("")];
        if ctx.me.role.can_publish_offers() {
            lines.push(Line::from(Span::styled(
                "c create an offer",
                Style::default().fg(Color::DarkGray),
            )));
        }
        lines.push(Line::from(Span::styled(
            "Enter browse offers",
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_sync_panel(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("SYNC")
            .border_style(self.border_style(DashboardPanel::Sync));

        let (label, color) = match self.data.sync {
            Some(SyncState::Ready) => ("synced", Color::LightGreen),
            Some(SyncState::Loading) => ("syncing", Color::Yellow),
            Some(SyncState::Error) => ("offline", Color::LightRed),
            Some(SyncState::Idle) | None => ("idle", Color::DarkGray),
        };
        let mut lines = vec![
            Line::from(vec![
                Span::styled("API   ", Style::default().fg(Color::DarkGray)),
                Span::raw(self.data.api_url.clone()),
            ]),
            Line::from(vec![
                Span::styled("State ", Style::default().fg(Color::DarkGray)),
                Span::styled(label, Style::default().fg(color)),
            ]),
        ];
        if let Some(error) = &self.data.last_error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::LightRed),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Enter refresh now",
            Style::default().fg(Color::DarkGray),
        )));

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Identity;
    use crate::domain::Role;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_panel_cycle() {
        let mut dashboard = Dashboard::new();
        dashboard.next_panel();
        dashboard.next_panel();
        assert_eq!(dashboard.active_panel(), DashboardPanel::Sync);
        dashboard.next_panel();
        assert_eq!(dashboard.active_panel(), DashboardPanel::Inbox);
        dashboard.prev_panel();
        assert_eq!(dashboard.active_panel(), DashboardPanel::Sync);
    }

    #[test]
    fn test_enter_targets_active_panel() {
        let mut dashboard = Dashboard::new();
        let mut ctx = Context::default();

        assert!(matches!(
            dashboard.handle_key(key(KeyCode::Enter), &mut ctx),
            Action::Emit(Signal::ChangeTab {
                tab: Tab::Messages,
                open_create: false
            })
        ));

        dashboard.handle_key(key(KeyCode::BackTab), &mut ctx);
        assert!(matches!(
            dashboard.handle_key(key(KeyCode::Enter), &mut ctx),
            Action::Emit(Signal::ForceRefresh)
        ));
    }

    #[test]
    fn test_create_shortcut_opens_form_on_offers() {
        let mut dashboard = Dashboard::new();
        let mut ctx = Context::new(Identity {
            user_id: "e1".to_string(),
            role: Role::Employer,
        });
        assert!(matches!(
            dashboard.handle_key(key(KeyCode::Char('c')), &mut ctx),
            Action::Emit(Signal::ChangeTab {
                tab: Tab::Offers,
                open_create: true
            })
        ));
    }

    #[test]
    fn test_create_shortcut_refused_without_employer_role() {
        let mut dashboard = Dashboard::new();
        for role in [Role::Driver, Role::Unknown] {
            let mut ctx = Context::new(Identity {
                user_id: "d1".to_string(),
                role,
            });
            assert!(matches!(
                dashboard.handle_key(key(KeyCode::Char('c')), &mut ctx),
                Action::Notify(_, NotifyLevel::Warn)
            ));
        }
    }
}
