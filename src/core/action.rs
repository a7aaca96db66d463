//! Actions that modules return to the app

use crate::domain::NewOffer;

use super::Signal;

/// What a module wants the app to do after handling input
#[derive(Debug, Clone)]
pub enum Action {
    /// No action needed
    None,

    /// Publish a signal on the event bus
    Emit(Signal),

    /// Send a chat message in a conversation
    SendMessage {
        conversation_id: String,
        content: String,
    },

    /// Mark a conversation read on the server
    MarkRead(String),

    /// Submit a validated offer
    CreateOffer(NewOffer),

    /// Show notification in status bar
    Notify(String, NotifyLevel),

    /// Close current overlay/popup
    CloseOverlay,

    /// Request quit
    Quit,
}

/// Notification levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Warn,
    Error,
}
