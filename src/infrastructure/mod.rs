//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - reqwest-based marketplace API client
//! - Tokio runtime bridge and the background sync worker

pub mod api;
pub mod runtime;

pub use api::{HttpApi, MarketplaceApi};
pub use runtime::{RuntimeBridge, RuntimeCommand, RuntimeEvent};
