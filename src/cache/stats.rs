//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Running counters kept by a cache instance.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of lookups that found a live entry
    pub hits: u64,
    /// Number of lookups that found nothing or an expired entry
    pub misses: u64,
    /// Number of entries evicted to make room for new ones
    pub evictions: u64,
    /// Number of entries dropped because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}

// == Stats Snapshot ==
/// Point-in-time view of a cache, as reported by `ResponseCache::stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    /// Current number of entries
    pub size: usize,
    /// Upper bound on entries
    pub max_size: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Rough size of the serialized entry map in bytes
    pub approximate_memory_usage: usize,
    /// `approximate_memory_usage` rounded to kilobytes, e.g. `"12KB"`
    pub memory_usage: String,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

impl StatsSnapshot {
    /// Builds a snapshot from the running counters and current sizes.
    pub fn new(
        stats: &CacheStats,
        size: usize,
        max_size: usize,
        approximate_memory_usage: usize,
    ) -> Self {
        Self {
            size,
            max_size,
            hit_rate: stats.hit_rate(),
            approximate_memory_usage,
            memory_usage: format_kilobytes(approximate_memory_usage),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
        }
    }
}

/// Formats a byte count as whole kilobytes, rounding to nearest.
fn format_kilobytes(bytes: usize) -> String {
    format!("{}KB", (bytes + 512) / 1024)
}
