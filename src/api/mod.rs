//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Stats of every cache
//! - `/caches/:domain/...` - Per-cache entry, invalidation and sweep operations

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
