//! Module trait for dashboard panels

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;
use ratatui::Frame;

use super::{Action, Context};

/// A panel that handles its own keyboard input and rendering
pub trait Module {
    /// Unique identifier for this module
    fn id(&self) -> &'static str;

    /// Handle keyboard input
    /// Returns an Action describing what should happen
    fn handle_key(&mut self, key: KeyEvent, ctx: &mut Context) -> Action;

    /// Render the panel into the given area
    fn render(&self, frame: &mut Frame, area: Rect, ctx: &Context);
}
