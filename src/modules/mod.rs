//! UI Modules
//!
//! Each panel implements the Module trait and handles its own key input
//! and rendering:
//! - dashboard: overview with inbox, offers and sync panels
//! - inbox: conversation list
//! - chat: one conversation with a compose line
//! - offers: offer list and the create-offer form
//!
//! `notifications` holds the unread banner and consent state.

pub mod chat;
pub mod dashboard;
pub mod inbox;
pub mod notifications;
pub mod offers;
