//! Durable Storage Module
//!
//! Key/value slots that persisted caches mirror their entries into.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::StorageError;

// == Storage Trait ==
/// A durable string store addressed by slot name.
pub trait CacheStorage: Send + Sync + std::fmt::Debug {
    /// Returns the slot's contents, or None if the slot has never been written.
    fn load(&self, slot: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the slot's contents.
    fn save(&self, slot: &str, contents: &str) -> Result<(), StorageError>;

    /// Removes the slot. Removing a missing slot is not an error.
    fn delete(&self, slot: &str) -> Result<(), StorageError>;
}

// == File Storage ==
/// Stores each slot as `<dir>/<slot>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a file store rooted at `dir`. The directory is created lazily
    /// on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, slot: &str) -> Result<PathBuf, StorageError> {
        if slot.is_empty() || slot.contains(['/', '\\']) || slot.starts_with('.') {
            return Err(StorageError::Unavailable(format!(
                "invalid slot name '{}'",
                slot
            )));
        }
        Ok(self.dir.join(format!("{}.json", slot)))
    }
}

impl CacheStorage for FileStorage {
    fn load(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(slot)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, slot: &str, contents: &str) -> Result<(), StorageError> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a half-written slot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, slot: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.slot_path(slot)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// == Memory Storage ==
/// In-process slot store.
///
/// Clones share the same slots, which lets tests simulate a restart by
/// building a second cache over a clone of the first cache's storage.
/// Can be switched into a failing mode to exercise error handling.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every operation fails with `StorageError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Reads a slot directly, bypassing the failure switch.
    pub fn raw(&self, slot: &str) -> Option<String> {
        self.slots.lock().ok()?.get(slot).cloned()
    }

    /// Writes a slot directly, bypassing the failure switch.
    pub fn put_raw(&self, slot: &str, contents: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(slot.to_string(), contents.to_string());
        }
    }

    fn slots(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("storage disabled".to_string()));
        }
        self.slots
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))
    }
}

impl CacheStorage for MemoryStorage {
    fn load(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.slots()?.get(slot).cloned())
    }

    fn save(&self, slot: &str, contents: &str) -> Result<(), StorageError> {
        self.slots()?.insert(slot.to_string(), contents.to_string());
        Ok(())
    }

    fn delete(&self, slot: &str) -> Result<(), StorageError> {
        self.slots()?.remove(slot);
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("cache"));

        assert_eq!(storage.load("slot").unwrap(), None);

        storage.save("slot", r#"{"a":1}"#).unwrap();
        assert_eq!(storage.load("slot").unwrap().as_deref(), Some(r#"{"a":1}"#));

        storage.save("slot", "{}").unwrap();
        assert_eq!(storage.load("slot").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_file_storage_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.save("slot", "{}").unwrap();
        storage.delete("slot").unwrap();
        assert_eq!(storage.load("slot").unwrap(), None);
        assert!(!dir.path().join("slot.json").exists());

        // Deleting again is fine
        storage.delete("slot").unwrap();
    }

    #[test]
    fn test_file_storage_rejects_path_like_slots() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        assert!(storage.save("../escape", "{}").is_err());
        assert!(storage.save("", "{}").is_err());
        assert!(matches!(
            storage.load("a/b"),
            Err(StorageError::Unavailable(_))
        ));
    }

    #[test]
    fn test_memory_storage_clones_share_slots() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.save("slot", "data").unwrap();
        assert_eq!(other.load("slot").unwrap().as_deref(), Some("data"));

        other.delete("slot").unwrap();
        assert_eq!(storage.raw("slot"), None);
    }

    #[test]
    fn test_memory_storage_failing_mode() {
        let storage = MemoryStorage::new();
        storage.put_raw("slot", "data");
        storage.set_failing(true);

        assert!(storage.load("slot").is_err());
        assert!(storage.save("slot", "x").is_err());
        assert!(storage.delete("slot").is_err());
        assert_eq!(storage.raw("slot").as_deref(), Some("data"));

        storage.set_failing(false);
        assert_eq!(storage.load("slot").unwrap().as_deref(), Some("data"));
    }
}
