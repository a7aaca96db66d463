//! Marketplace domain models

pub mod conversation;
pub mod offer;

pub use conversation::{
    format_age, unread_total, ConversationSummary, LastMessage, Message, Participant, Role,
};
pub use offer::{format_fcfa, NewOffer, Offer, OfferError};
