//! Offers panel and the create-offer form

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::core::{Action, Context, Module, Signal};
use crate::domain::{NewOffer, Offer};

const FIELDS: [&str; 5] = [
    "Title",
    "Location",
    "Salary (FCFA)",
    "Contract",
    "Description",
];

#[derive(Debug, Clone, Default)]
pub struct CreateOfferForm {
    values: [String; 5],
    focus: usize,
    error: Option<String>,
}

impl CreateOfferForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        FIELDS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FIELDS.len();
    }

    fn prev_field(&mut self) {
        self.focus = (self.focus + FIELDS.len() - 1) % FIELDS.len();
    }

    /// Validate the fields; the form keeps its values on failure
    pub fn submit(&mut self) -> Option<NewOffer> {
        let [title, location, salary, contract, description] = &self.values;
        match NewOffer::from_fields(title, location, salary, contract, description) {
            Ok(offer) => {
                self.error = None;
                Some(offer)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                None
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => Action::CloseOverlay,
            KeyCode::Tab | KeyCode::Down => {
                self.next_field();
                Action::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.prev_field();
                Action::None
            }
            KeyCode::Enter => match self.submit() {
                Some(offer) => Action::CreateOffer(offer),
                None => Action::None,
            },
            KeyCode::Backspace => {
                self.values[self.focus].pop();
                Action::None
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.values[self.focus].push(ch);
                Action::None
            }
            _ => Action::None,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut lines = Vec::with_capacity(FIELDS.len() * 2 + 3);
        for (idx, (label, value)) in self.fields().enumerate() {
            let focused = idx == self.focus;
            let label_style = if focused {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            lines.push(Line::from(Span::styled(label, label_style)));
            let cursor = if focused { "▏" } else { "" };
            lines.push(Line::from(format!("  {value}{cursor}")));
        }
        lines.push(Line::from(""));
        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.as_str(),
                Style::default().fg(Color::LightRed),
            )));
        }
        lines.push(Line::from(Span::styled(
            "Tab next · Enter publish · Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let block = Block::default()
            .borders(Borders::ALL)
            .title("NEW OFFER")
            .border_style(Style::default().fg(Color::Yellow));
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}

#[derive(Debug, Default)]
pub struct OffersPanel {
    offers: Vec<Offer>,
    selected: usize,
    loaded: bool,
    from_cache: bool,
    form: Option<CreateOfferForm>,
}

impl OffersPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn from_cache(&self) -> bool {
        self.from_cache
    }

    pub fn selected(&self) -> Option<&Offer> {
        self.offers.get(self.selected)
    }

    pub fn form(&self) -> Option<&CreateOfferForm> {
        self.form.as_ref()
    }

    pub fn form_open(&self) -> bool {
        self.form.is_some()
    }

    /// Opening twice keeps the fields already typed
    pub fn open_form(&mut self) {
        if self.form.is_none() {
            self.form = Some(CreateOfferForm::new());
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    pub fn apply(&mut self, offers: Vec<Offer>, cached: bool) {
        self.offers = offers;
        self.loaded = true;
        self.from_cache = cached;
        self.selected = self.selected.min(self.offers.len().saturating_sub(1));
    }

    /// A freshly published offer goes first
    pub fn prepend(&mut self, offer: Offer) {
        self.offers.retain(|o| o.id != offer.id);
        self.offers.insert(0, offer);
        self.selected = 0;
    }
}

impl Module for OffersPanel {
    fn id(&self) -> &'static str {
        "offers"
    }

    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action {
        if let Some(form) = self.form.as_mut() {
            return match form.handle_key(key) {
                Action::CloseOverlay => {
                    self.form = None;
                    Action::None
                }
                other => other,
            };
        }

        match key.code {
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
                Action::None
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.offers.len() {
                    self.selected += 1;
                }
                Action::None
            }
            KeyCode::Char('c') if !ctx.me.role.can_publish_offers() => Action::Notify(
                "Only employers can publish offers".to_string(),
                crate::core::NotifyLevel::Warn,
            ),
            KeyCode::Char('c') => Action::Emit(Signal::OpenCreateOffer),
            _ => Action::None,
        }
    }

    fn render(&self, frame: &mut Frame, area: Rect, _ctx: &Context) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let title = if self.from_cache {
            "OFFERS (cached)"
        } else {
            "OFFERS"
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(Style::default().fg(Color::Cyan));

        if self.offers.is_empty() {
            let text = if self.loaded {
                "No offers published. Press c to create one."
            } else {
                "Loading offers…"
            };
            frame.render_widget(Paragraph::new(text).block(block), chunks[0]);
        } else {
            let items: Vec<ListItem> = self
                .offers
                .iter()
                .map(|offer| {
                    ListItem::new(Line::from(vec![
                        Span::raw(offer.title.as_str()),
                        Span::styled(
                            format!("  {}", offer.location),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .block(block)
                .highlight_style(Style::default().bg(Color::DarkGray))
                .highlight_symbol("› ");
            let mut state = ListState::default();
            state.select(Some(self.selected));
            frame.render_stateful_widget(list, chunks[0], &mut state);
        }

        let detail = match (&self.form, self.selected()) {
            (Some(form), _) => {
                form.render(frame, chunks[1]);
                return;
            }
            (None, Some(offer)) => offer_detail(offer),
            (None, None) => vec![Line::from("")],
        };
        frame.render_widget(
            Paragraph::new(detail)
                .block(Block::default().borders(Borders::ALL).title("DETAIL"))
                .wrap(Wrap { trim: true }),
            chunks[1],
        );
    }
}

fn offer_detail(offer: &Offer) -> Vec<Line<'_>> {
    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(Span::styled(
            offer.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Location  ", label),
            Span::raw(offer.location.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Salary    ", label),
            Span::raw(offer.salary_display()),
        ]),
    ];
    if let Some(contract) = &offer.contract_type {
        lines.push(Line::from(vec![
            Span::styled("Contract  ", label),
            Span::raw(contract.as_str()),
        ]));
    }
    if let Some(status) = &offer.status {
        lines.push(Line::from(vec![
            Span::styled("Status    ", label),
            Span::raw(status.as_str()),
        ]));
    }
    if let Some(description) = &offer.description {
        lines.push(Line::from(""));
        lines.push(Line::from(description.as_str()));
    }
    lines
}
