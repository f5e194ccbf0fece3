//! Cache Store Module
//!
//! The response cache: HashMap storage with FIFO eviction, lazy TTL expiry,
//! pattern invalidation and optional best-effort persistence.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::cache::persist::OrderedEntries;
use crate::cache::{
    derive_key, CacheEntry, CacheStats, Clock, InsertionOrder, KeyMode, Persistence,
    StatsSnapshot, SystemClock,
};

// == Response Cache ==
/// Bounded, time-expiring store for responses of read-only operations.
///
/// Entries are addressed by an identifier (typically a URL path) plus an
/// optional params object. When full, the earliest-inserted entry is evicted;
/// reads never change eviction order. Expired entries are dropped lazily, on
/// access or by [`cleanup`](Self::cleanup).
#[derive(Debug)]
pub struct ResponseCache<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Insertion order for eviction
    order: InsertionOrder,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_size: usize,
    /// TTL in milliseconds for entries set without one
    default_ttl: u64,
    key_mode: KeyMode,
    clock: Arc<dyn Clock>,
    /// Durable slot, when persistence is enabled
    persistence: Option<Persistence>,
}

impl<T> ResponseCache<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    // == Constructor ==
    /// Creates an in-memory cache.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries (at least 1)
    /// * `default_ttl` - TTL in milliseconds for entries set without one
    pub fn new(max_size: usize, default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            stats: CacheStats::new(),
            max_size: max_size.max(1),
            default_ttl,
            key_mode: KeyMode::default(),
            clock: Arc::new(SystemClock),
            persistence: None,
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets how params are folded into keys.
    pub fn with_key_mode(mut self, key_mode: KeyMode) -> Self {
        self.key_mode = key_mode;
        self
    }

    // == With Persistence ==
    /// Enables persistence and loads whatever the slot already holds.
    ///
    /// Loaded entries are not checked for expiry here; that happens on
    /// access. If the slot holds more entries than `max_size`, the oldest
    /// are dropped.
    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        for (key, entry) in persistence.load::<T>() {
            self.order.record(&key);
            self.entries.insert(key, entry);
        }
        while self.entries.len() > self.max_size {
            match self.order.pop_oldest() {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
        self.persistence = Some(persistence);
        self
    }

    // == Key For ==
    /// Returns the cache key `identifier` and `params` resolve to.
    pub fn key_for(&self, identifier: &str, params: Option<&Value>) -> String {
        derive_key(identifier, params, self.key_mode)
    }

    // == Set ==
    /// Stores `value` under `identifier` and `params`.
    ///
    /// If the cache is at capacity, the earliest-inserted entry is evicted
    /// first, even when this call overwrites an existing key. Overwriting
    /// keeps the key's original insertion position.
    ///
    /// # Arguments
    /// * `identifier` - Resource identifier, e.g. `/products`
    /// * `value` - The value to cache
    /// * `params` - Optional params; only their serialized form is kept, in the key
    /// * `custom_ttl` - TTL in milliseconds; None or 0 means `default_ttl`
    pub fn set(
        &mut self,
        identifier: &str,
        value: T,
        params: Option<&Value>,
        custom_ttl: Option<u64>,
    ) {
        if self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let key = self.key_for(identifier, params);
        let ttl = custom_ttl.filter(|ttl| *ttl > 0).unwrap_or(self.default_ttl);
        let entry = CacheEntry::new(value, self.clock.now_ms(), ttl);

        self.entries.insert(key.clone(), entry);
        self.order.record(&key);
        self.persist();
    }

    // == Get ==
    /// Returns the live value for `identifier` and `params`, if any.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&mut self, identifier: &str, params: Option<&Value>) -> Option<T> {
        self.live_entry(identifier, params).cloned()
    }

    // == Has ==
    /// Like [`get`](Self::get) but only reports presence.
    pub fn has(&mut self, identifier: &str, params: Option<&Value>) -> bool {
        self.live_entry(identifier, params).is_some()
    }

    // == Invalidate ==
    /// Removes the entry for `identifier` and `params`.
    ///
    /// Returns whether an entry was removed.
    pub fn invalidate(&mut self, identifier: &str, params: Option<&Value>) -> bool {
        let key = self.key_for(identifier, params);
        let removed = self.remove_key(&key);
        if removed {
            self.persist();
        }
        removed
    }

    // == Invalidate Pattern ==
    /// Removes every entry whose key contains `pattern` literally.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_pattern(&mut self, pattern: &str) -> usize {
        let matching: Vec<String> = self
            .order
            .iter()
            .filter(|key| key.contains(pattern))
            .cloned()
            .collect();

        for key in &matching {
            self.remove_key(key);
        }

        if !matching.is_empty() {
            debug!(pattern, removed = matching.len(), "Invalidated cache entries by pattern");
            self.persist();
        }
        matching.len()
    }

    // == Clear ==
    /// Removes all entries and deletes the durable slot.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        if let Some(persistence) = &self.persistence {
            persistence.remove();
        }
    }

    // == Cleanup ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired: Vec<String> = self
            .order
            .iter()
            .filter(|key| {
                self.entries
                    .get(key.as_str())
                    .is_some_and(|entry| entry.is_expired(now))
            })
            .cloned()
            .collect();

        for key in &expired {
            self.remove_key(key);
        }

        if !expired.is_empty() {
            self.stats.record_expirations(expired.len());
            self.persist();
        }
        expired.len()
    }

    // == Stats ==
    /// Returns size, capacity, hit rate and approximate memory usage.
    pub fn stats(&self) -> StatsSnapshot {
        let approximate_memory_usage = self
            .ordered_entries()
            .to_json()
            .map(|json| json.len())
            .unwrap_or(0);
        StatsSnapshot::new(
            &self.stats,
            self.entries.len(),
            self.max_size,
            approximate_memory_usage,
        )
    }

    /// Keys currently held, oldest first. Includes expired entries not yet swept.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    /// Whether `key` holds a live entry, without touching stats or removing
    /// anything.
    #[cfg(test)]
    pub(crate) fn is_live_key(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    // == Internal helpers ==

    fn live_entry(&mut self, identifier: &str, params: Option<&Value>) -> Option<&T> {
        let key = self.key_for(identifier, params);
        let now = self.clock.now_ms();

        match self.entries.get(&key).map(|entry| entry.is_expired(now)) {
            None => {
                self.stats.record_miss();
                None
            }
            Some(true) => {
                self.remove_key(&key);
                self.stats.record_expirations(1);
                self.stats.record_miss();
                self.persist();
                None
            }
            Some(false) => {
                self.stats.record_hit();
                self.entries.get(&key).map(|entry| &entry.data)
            }
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(key) = self.order.pop_oldest() {
            self.entries.remove(&key);
            self.stats.record_eviction();
            debug!(key = %key, "Evicted oldest cache entry");
        }
    }

    fn remove_key(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    fn ordered_entries(&self) -> OrderedEntries<'_, T> {
        OrderedEntries {
            order: &self.order,
            entries: &self.entries,
        }
    }

    fn persist(&self) {
        if let Some(persistence) = &self.persistence {
            persistence.sync(&self.ordered_entries());
        }
    }
}
