//! Process-local storage

pub mod cache;

pub use cache::{SharedCache, TtlCache};
