//! Cache Module
//!
//! Bounded, TTL-based response caching with FIFO eviction, pattern
//! invalidation and optional best-effort persistence.

mod clock;
mod entry;
mod fetch;
mod key;
mod order;
mod persist;
mod registry;
mod stats;
mod storage;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use fetch::get_or_fetch;
pub use key::{derive_key, KeyMode};
pub use order::InsertionOrder;
pub use persist::Persistence;
pub use registry::{CacheDomain, CacheRegistry, RegistryStats, SharedCache};
pub use stats::{CacheStats, StatsSnapshot};
pub use storage::{CacheStorage, FileStorage, MemoryStorage};
pub use store::ResponseCache;

// == Public Constants ==
/// Interval between expiry sweeps, in milliseconds
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60 * 1000;
