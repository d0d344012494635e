//! Key-value storage for viewer flags
//!
//! "Watched video" and "seen modal" flags are read and written through an
//! injected [`KeyValueStore`], so callers decide where they live and tests
//! can use [`MemoryStore`].

use crate::Result;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// String key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// An in-memory store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A store persisted as one JSON object
///
/// Every write rewrites the file through a temporary sibling and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open `path`, starting empty if it does not exist yet
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| IoError::new(ErrorKind::InvalidData, e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!("Opened flag store {} ({} entries)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries).map_err(|e| IoError::new(ErrorKind::InvalidData, e))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    // Memory only changes once the file write succeeded
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}

/// Per-viewer flags on top of any store
pub struct ViewerFlags<S> {
    store: S,
}

impl<S: KeyValueStore> ViewerFlags<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mark_video_watched(&self, video_id: &str) -> Result<()> {
        self.store.set(&format!("watched_video_{}", video_id), "true")
    }

    pub fn is_video_watched(&self, video_id: &str) -> bool {
        self.flag(&format!("watched_video_{}", video_id))
    }

    pub fn mark_modal_seen(&self, modal: &str) -> Result<()> {
        self.store.set(&format!("seen_modal_{}", modal), "true")
    }

    pub fn has_seen_modal(&self, modal: &str) -> bool {
        self.flag(&format!("seen_modal_{}", modal))
    }

    /// Forget a modal so it shows again
    pub fn reset_modal(&self, modal: &str) -> Result<()> {
        self.store.remove(&format!("seen_modal_{}", modal))
    }

    fn flag(&self, key: &str) -> bool {
        self.store.get(key).as_deref() == Some("true")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_flags() {
        let flags = ViewerFlags::new(MemoryStore::new());
        assert!(!flags.is_video_watched("42"));

        flags.mark_video_watched("42").unwrap();
        assert!(flags.is_video_watched("42"));
        assert!(!flags.is_video_watched("43"));

        flags.mark_modal_seen("welcome").unwrap();
        assert!(flags.has_seen_modal("welcome"));
        flags.reset_modal("welcome").unwrap();
        assert!(!flags.has_seen_modal("welcome"));
        assert_eq!(flags.store().len(), 1);
    }

    #[test]
    fn test_memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("lang", "ar").unwrap();
        assert_eq!(other.get("lang").as_deref(), Some("ar"));
    }

    #[test]
    fn test_json_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");

        {
            let flags = ViewerFlags::new(JsonFileStore::open(&path).unwrap());
            flags.mark_video_watched("intro").unwrap();
            flags.mark_modal_seen("promo").unwrap();
        }

        let reopened = ViewerFlags::new(JsonFileStore::open(&path).unwrap());
        assert!(reopened.is_video_watched("intro"));
        assert!(reopened.has_seen_modal("promo"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_json_store_failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set("watched_video_1", "true").unwrap();

        // Writes now fail: the parent directory is gone
        std::fs::remove_dir_all(dir.path()).unwrap();

        assert!(store.set("watched_video_2", "true").is_err());
        assert_eq!(store.get("watched_video_2"), None);

        assert!(store.remove("watched_video_1").is_err());
        assert_eq!(store.get("watched_video_1").as_deref(), Some("true"));

        // Removing a missing key needs no write
        assert!(store.remove("never_set").is_ok());
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(JsonFileStore::open(&path).is_err());
    }
}
