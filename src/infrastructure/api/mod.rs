//! Marketplace REST API client

mod client;

pub use client::{ApiError, ApiResult, HttpApi, MarketplaceApi};
