//! Tab-based UI rendering

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs as RataTabs};
use ratatui::Frame;

use crate::app::{App, Tab};
use crate::config::{self, NotificationPermission};
use crate::core::Module;

/// Draw the tab bar at the top, with the unread badge on Messages
pub fn draw_tab_bar(f: &mut Frame, area: Rect, app: &App) {
    let unread = app.inbox.unread();
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            let mut spans = vec![
                Span::styled(
                    format!("{}:", tab.shortcut()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(tab.title()),
            ];
            if *tab == Tab::Messages && unread > 0 {
                spans.push(Span::styled(
                    format!(" ({})", badge(unread)),
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            Line::from(spans)
        })
        .collect();

    let selected = Tab::ALL
        .iter()
        .position(|t| *t == app.current_tab)
        .unwrap_or(0);

    let tabs = RataTabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");

    f.render_widget(tabs, area);
}

/// Badge text; large counts are capped
pub fn badge(unread: u32) -> String {
    if unread > 99 {
        "99+".to_string()
    } else {
        unread.to_string()
    }
}

pub fn draw_overview_tab(f: &mut Frame, area: Rect, app: &App) {
    app.dashboard.render(f, area, &app.ctx);
}

pub fn draw_offers_tab(f: &mut Frame, area: Rect, app: &App) {
    app.offers.render(f, area, &app.ctx);
}

/// Conversation list on the left, open chat on the right
pub fn draw_messages_tab(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    app.inbox.render(f, chunks[0], &app.ctx);

    match &app.chat {
        Some(chat) => chat.render(f, chunks[1], &app.ctx),
        None => {
            let hint = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "Select a conversation and press Enter",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .block(Block::default().borders(Borders::ALL).title("CHAT"));
            f.render_widget(hint, chunks[1]);
        }
    }
}

pub fn draw_profile_tab(f: &mut Frame, area: Rect, app: &App) {
    let label = Style::default().fg(Color::DarkGray);
    let user = if app.ctx.me.user_id.is_empty() {
        "(not set)".to_string()
    } else {
        app.ctx.me.user_id.clone()
    };
    let notifications = match app.notifier.permission() {
        NotificationPermission::Ask => "ask on first message",
        NotificationPermission::Granted => "enabled",
        NotificationPermission::Denied => "disabled",
    };
    let config_path = config::config_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());
    let log_path = config::log_path()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(unknown)".to_string());

    let lines = vec![
        Line::from(vec![Span::styled("User           ", label), Span::raw(user)]),
        Line::from(vec![
            Span::styled("Role           ", label),
            Span::raw(app.ctx.me.role.label()),
        ]),
        Line::from(vec![
            Span::styled("API            ", label),
            Span::raw(app.api_url.clone()),
        ]),
        Line::from(vec![
            Span::styled("Notifications  ", label),
            Span::raw(notifications),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled("Config         ", label), Span::raw(config_path)]),
        Line::from(vec![Span::styled("Log            ", label), Span::raw(log_path)]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("PROFILE")
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_caps_large_counts() {
        assert_eq!(badge(7), "7");
        assert_eq!(badge(99), "99");
        assert_eq!(badge(250), "99+");
    }
}
