use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;
pub mod tabs;

use crate::app::{App, InputMode, PromptKind, StatusLevel, Tab};
use crate::infrastructure::runtime::SyncState;

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.size();
    let banner = app.notifier.banner().map(|banner| banner.text());
    let areas = layout::areas(size, banner.is_some());

    tabs::draw_tab_bar(f, areas.tab_bar, app);
    if let Some(text) = banner {
        draw_banner(f, areas.banner, &text);
    }

    match app.current_tab {
        Tab::Overview => tabs::draw_overview_tab(f, areas.main, app),
        Tab::Offers => tabs::draw_offers_tab(f, areas.main, app),
        Tab::Messages => tabs::draw_messages_tab(f, areas.main, app),
        Tab::Profile => tabs::draw_profile_tab(f, areas.main, app),
    }

    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.input_mode == InputMode::Prompt(PromptKind::NotificationPermission) {
        draw_permission_popup(f, areas.size);
    }
    if app.help_open {
        draw_help_popup(f, areas.size, app);
    }
}

fn draw_banner(f: &mut Frame, area: Rect, text: &str) {
    let line = Line::from(vec![
        Span::styled(
            " ✉ ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {text}"), Style::default().fg(Color::LightYellow)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let (sync_label, sync_color) = match app.sync_state {
        SyncState::Ready => (app.sync_state.label(), Color::LightGreen),
        SyncState::Loading => (app.sync_state.label(), Color::Yellow),
        SyncState::Error => (app.sync_state.label(), Color::LightRed),
        SyncState::Idle => (app.sync_state.label(), Color::DarkGray),
    };
    let mut spans = vec![
        Span::styled("●", Style::default().fg(sync_color)),
        Span::raw(format!(" {sync_label}  ")),
        Span::styled("Unread ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}  ", app.inbox.unread())),
        Span::styled("Tab ", Style::default().fg(Color::DarkGray)),
        Span::raw(app.current_tab.title()),
    ];
    if let Some(chat) = &app.chat {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("Chat ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::raw(chat.participant().name.clone()));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("tab", "Switch tab: tab <overview|offers|messages|profile>"),
        ("overview", "Go to overview"),
        ("messages", "Go to messages"),
        ("profile", "Go to profile"),
        ("chat", "Open a conversation: chat <id>"),
        ("read", "Mark a conversation read: read <id>"),
        ("refresh", "Refresh now"),
        ("offers", "Reload offers"),
        ("offer", "Create an offer"),
        ("help", "Show help"),
        ("quit", "Quit"),
    ];

    commands
        .into_iter()
        .find(|(cmd, _)| cmd.starts_with(&input))
        .map(|(_, desc)| desc)
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint_text = command_hint(&app.command.input).unwrap_or("type a command");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.as_str()),
                Span::styled(
                    format!("  {hint_text}"),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Prompt(PromptKind::NotificationPermission) => Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::LightCyan)),
            Span::raw("Enable message notifications? "),
            Span::styled("(y/n)", Style::default().fg(Color::DarkGray)),
        ]),
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    StatusLevel::Info => Color::LightGreen,
                    StatusLevel::Warn => Color::LightYellow,
                    StatusLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text, Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let hints: &[(&str, &str)] = match app.current_tab {
        Tab::Overview => &[("Tab", "panel"), ("Enter", "open"), ("c", "new offer")],
        Tab::Offers if app.offers.form_open() => &[("Tab", "field"), ("Enter", "publish"), ("Esc", "cancel")],
        Tab::Offers => &[("j/k", "move"), ("c", "new offer")],
        Tab::Messages if app.chat.as_ref().is_some_and(|c| c.is_composing()) => {
            &[("Enter", "send"), ("Esc", "stop writing")]
        }
        Tab::Messages if app.chat.is_some() => &[("i", "write"), ("Esc", "close chat")],
        Tab::Messages => &[("j/k", "move"), ("Enter", "open chat")],
        Tab::Profile => &[],
    };

    let mut spans = Vec::new();
    for (key, desc) in hints
        .iter()
        .chain([("r", "refresh"), (":", "command"), ("?", "help"), ("q", "quit")].iter())
    {
        spans.push(Span::styled(
            format!("{key} "),
            Style::default().fg(Color::Cyan),
        ));
        spans.push(Span::styled(
            format!("{desc}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn draw_permission_popup(f: &mut Frame, area: Rect) {
    let popup_area = layout::centered_rect(50, 24, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from(""),
        Line::from("You have new messages."),
        Line::from("Show a banner and ring the bell when more arrive?"),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(Color::LightGreen)),
            Span::raw(" yes   "),
            Span::styled("n", Style::default().fg(Color::LightRed)),
            Span::raw(" no"),
        ]),
    ];
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Notifications").borders(Borders::ALL))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, popup_area);
}

fn draw_help_popup(f: &mut Frame, area: Rect, app: &App) {
    let popup_area = layout::centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  1-4        Overview / Offers / Messages / Profile"),
        Line::from("  j / k      Move selection"),
        Line::from("  Tab        Next panel or field"),
        Line::from("  Enter      Open / submit"),
        Line::from("  Esc        Back / close"),
        Line::from(""),
        Line::from("Actions"),
        Line::from("  i          Write a message (chat)"),
        Line::from("  c          Create an offer"),
        Line::from("  m          Open messages from a notification"),
        Line::from("  r          Refresh now"),
        Line::from("  :          Command line"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from("Commands"),
        Line::from("  :tab offres   :chat <id>   :read <id>"),
        Line::from("  :refresh      :offer       :offers"),
        Line::from(""),
        Line::from(format!("Active tab: {}", app.current_tab.title())),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_hint_prefix() {
        assert_eq!(command_hint("ref"), Some("Refresh now"));
        assert_eq!(command_hint(""), None);
        assert_eq!(command_hint("zzz"), None);
    }
}
