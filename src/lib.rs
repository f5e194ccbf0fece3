//! RitKART Cache - Response caching for the storefront API
//!
//! Bounded, TTL-based key/value caches with FIFO eviction, pattern
//! invalidation and best-effort persistence, one per data domain.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheRegistry, ResponseCache};
pub use client::CachedClient;
pub use config::Config;
pub use tasks::spawn_cleanup_task;
