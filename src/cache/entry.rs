//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// A single cached payload plus the metadata needed to expire it.
///
/// Serialized field names match the persisted slot format
/// (`{"data": ..., "timestamp": ..., "ttl": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached value
    pub data: T,
    /// Creation time (Unix milliseconds)
    pub timestamp: u64,
    /// Time to live in milliseconds, counted from `timestamp`
    pub ttl: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates an entry stamped at `now`.
    pub fn new(data: T, now: u64, ttl: u64) -> Self {
        Self {
            data,
            timestamp: now,
            ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at time `now`.
    ///
    /// An entry is expired once strictly more than `ttl` milliseconds have
    /// passed since it was stamped; at exactly `ttl` it is still live.
    /// Timestamps from the future (clock skew in persisted data) never count
    /// as expired.
    pub fn is_expired(&self, now: u64) -> bool {
        now.saturating_sub(self.timestamp) > self.ttl
    }
}
