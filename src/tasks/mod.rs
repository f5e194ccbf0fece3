//! Background Tasks Module
//!
//! Contains background tasks that run periodically while caches are alive.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache entries at a fixed interval

mod cleanup;

pub use cleanup::{spawn_cleanup_task, SweepHandle};
