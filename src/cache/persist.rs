//! Persistence Module
//!
//! Best-effort mirroring of a cache's entries into one durable storage slot.
//!
//! The slot holds a JSON object mapping cache key to entry, written in
//! insertion order so that FIFO eviction order survives a reload.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStorage, InsertionOrder};

// == Ordered Entries ==
/// Serializes entries as a JSON object in insertion order.
pub(crate) struct OrderedEntries<'a, T> {
    pub order: &'a InsertionOrder,
    pub entries: &'a HashMap<String, CacheEntry<T>>,
}

impl<T: Serialize> Serialize for OrderedEntries<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.order
                .iter()
                .filter_map(|key| self.entries.get(key).map(|entry| (key, entry))),
        )
    }
}

impl<T: Serialize> OrderedEntries<'_, T> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// == Persisted Entries ==
/// Entries read back from a slot, in document order.
struct PersistedEntries<T>(Vec<(String, CacheEntry<T>)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for PersistedEntries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = PersistedEntries<T>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of cache keys to entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, entry)) = map.next_entry::<String, CacheEntry<T>>()? {
                    entries.push((key, entry));
                }
                Ok(PersistedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

// == Persistence ==
/// A cache's handle on its durable slot.
///
/// Every method absorbs storage failures: they are logged as warnings and
/// the call behaves as though persistence were off.
#[derive(Debug, Clone)]
pub struct Persistence {
    storage: Arc<dyn CacheStorage>,
    slot: String,
}

impl Persistence {
    pub fn new(storage: Arc<dyn CacheStorage>, slot: impl Into<String>) -> Self {
        Self {
            storage,
            slot: slot.into(),
        }
    }

    // == Load ==
    /// Reads previously persisted entries, oldest first.
    ///
    /// Missing, unreadable or malformed data all yield an empty list.
    /// Expired entries are returned as-is.
    pub fn load<T: DeserializeOwned>(&self) -> Vec<(String, CacheEntry<T>)> {
        let raw = match self.storage.load(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Failed to load cache from storage");
                return Vec::new();
            }
        };

        match serde_json::from_str::<PersistedEntries<T>>(&raw) {
            Ok(PersistedEntries(entries)) => {
                debug!(slot = %self.slot, count = entries.len(), "Loaded persisted cache entries");
                entries
            }
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Discarding malformed persisted cache data");
                Vec::new()
            }
        }
    }

    // == Sync ==
    /// Overwrites the slot with the given entries.
    pub(crate) fn sync<T: Serialize>(&self, entries: &OrderedEntries<'_, T>) {
        let json = match entries.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(slot = %self.slot, error = %e, "Failed to serialize cache for storage");
                return;
            }
        };

        if let Err(e) = self.storage.save(&self.slot, &json) {
            warn!(slot = %self.slot, error = %e, "Failed to save cache to storage");
        }
    }

    // == Remove ==
    /// Deletes the slot entirely.
    pub fn remove(&self) {
        if let Err(e) = self.storage.delete(&self.slot) {
            warn!(slot = %self.slot, error = %e, "Failed to remove cache from storage");
        }
    }
}
