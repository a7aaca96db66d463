//! Chauffeur: terminal dashboard for the driver/employer marketplace
//!
//! Keeps the inbox unread count fresh with interval polling plus debounced
//! signal-driven refreshes, caches API responses with a TTL, and routes
//! navigation between dashboard regions over an in-process signal bus.

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod modules;
pub mod store;
pub mod ui;
