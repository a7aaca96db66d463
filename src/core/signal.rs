//! Named signals exchanged between dashboard regions

use crate::app::Tab;
use crate::domain::Participant;

/// A signal and its detail payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Show the create-offer form
    OpenCreateOffer,
    /// Switch the dashboard tab, optionally opening the create form on arrival
    ChangeTab { tab: Tab, open_create: bool },
    /// Open the chat panel for a conversation
    OpenChat {
        conversation_id: String,
        participant: Participant,
    },
    /// Jump to the messages tab
    OpenMessages,
    /// A message was accepted by the server
    MessageSent { conversation_id: String },
    /// New incoming messages were seen in a conversation
    MessageReceived { conversation_id: String },
    /// The server confirmed a conversation as read
    ConversationRead { conversation_id: String },
    /// User asked for fresh data
    ForceRefresh,
    /// Terminal regained focus
    WindowFocused,
}

/// Signal name without payload, used to register handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    OpenCreateOffer,
    ChangeTab,
    OpenChat,
    OpenMessages,
    MessageSent,
    MessageReceived,
    ConversationRead,
    ForceRefresh,
    WindowFocused,
}

impl SignalKind {
    /// Signals handled by the dashboard shell
    pub const NAVIGATION: [SignalKind; 4] = [
        SignalKind::OpenCreateOffer,
        SignalKind::ChangeTab,
        SignalKind::OpenChat,
        SignalKind::OpenMessages,
    ];

    /// Signals that should lead to a conversation refresh
    pub const REFRESH: [SignalKind; 5] = [
        SignalKind::MessageReceived,
        SignalKind::MessageSent,
        SignalKind::ConversationRead,
        SignalKind::ForceRefresh,
        SignalKind::WindowFocused,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SignalKind::OpenCreateOffer => "open-create-offer",
            SignalKind::ChangeTab => "change-tab",
            SignalKind::OpenChat => "open-chat",
            SignalKind::OpenMessages => "open-messages",
            SignalKind::MessageSent => "message-sent",
            SignalKind::MessageReceived => "message-received",
            SignalKind::ConversationRead => "conversation-read",
            SignalKind::ForceRefresh => "force-refresh",
            SignalKind::WindowFocused => "window-focused",
        }
    }
}

impl Signal {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::OpenCreateOffer => SignalKind::OpenCreateOffer,
            Signal::ChangeTab { .. } => SignalKind::ChangeTab,
            Signal::OpenChat { .. } => SignalKind::OpenChat,
            Signal::OpenMessages => SignalKind::OpenMessages,
            Signal::MessageSent { .. } => SignalKind::MessageSent,
            Signal::MessageReceived { .. } => SignalKind::MessageReceived,
            Signal::ConversationRead { .. } => SignalKind::ConversationRead,
            Signal::ForceRefresh => SignalKind::ForceRefresh,
            Signal::WindowFocused => SignalKind::WindowFocused,
        }
    }
}
