//! Shared context passed to modules

use crate::app::Tab;
use crate::domain::Role;

/// Who is signed in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

/// Shared context available to all modules
#[derive(Debug, Clone)]
pub struct Context {
    pub me: Identity,

    /// Tab currently shown by the dashboard
    pub active_tab: Tab,

    /// Last known unread aggregate
    pub unread: u32,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            me: Identity::default(),
            active_tab: Tab::Overview,
            unread: 0,
        }
    }
}

impl Context {
    pub fn new(me: Identity) -> Self {
        Self {
            me,
            ..Self::default()
        }
    }

    /// Whether a sender id belongs to the signed-in user
    pub fn is_me(&self, sender_id: &str) -> bool {
        !self.me.user_id.is_empty() && self.me.user_id == sender_id
    }
}
