//! Runtime infrastructure - Tokio runtime bridge and the sync worker

mod bridge;
mod scheduler;
mod tracker;
mod worker;

pub use bridge::{forward_triggers, RuntimeBridge, RuntimeCommand, RuntimeEvent};
pub use scheduler::{RefreshScheduler, Trigger};
pub use tracker::{RequestId, SyncState, UnreadChange, UnreadTracker};
pub use worker::{run_async_worker, SyncSettings, CONVERSATIONS_KEY, OFFERS_KEY};
