//! Key-value persistence adapters.
//!
//! Everything the application remembers between runs goes through the
//! [`KeyValueStore`] trait: the issue collection, the article-image cache and
//! the admin grant. Each key holds one JSON document that is replaced whole on
//! every write. Writers do not lock; the last write wins.
//!
//! - [`FileStore`]: one `<key>.json` file per key under a data directory
//! - [`MemoryStore`]: a `HashMap` behind a mutex, for tests and `--offline` dry runs

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::StorageError;

/// Storage key holding the serialized issue collection.
pub const ISSUES_KEY: &str = "issues";
/// Storage key holding the article URL → image URL table.
pub const IMAGE_CACHE_KEY: &str = "image_cache";
/// Storage key remembering a granted admin session.
pub const ADMIN_KEY: &str = "is_admin";

/// Read/write interface over string values.
pub trait KeyValueStore: Send + Sync {
    /// Return the raw value stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Read `key` and decode it as JSON.
pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match store.read(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
    }
}

/// Encode `value` as JSON and write it under `key`.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.write(key, &raw)
}

/// File-backed store: `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created lazily on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl KeyValueStore for FileStore {
    #[instrument(level = "debug", skip(self))]
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => {
                debug!(path = %path.display(), bytes = raw.len(), "Read stored value");
                Ok(Some(raw))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    #[instrument(level = "debug", skip(self, value), fields(bytes = value.len()))]
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Write to a sibling temp file first so a crash never leaves half a blob.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        debug!(path = %path.display(), "Wrote stored value");
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_memory_store_read_write() {
        let store = MemoryStore::new();
        assert_eq!(store.read("k").unwrap(), None);
        store.write("k", "v1").unwrap();
        store.write("k", "v2").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.read(ISSUES_KEY).unwrap(), None);
        store.write(ISSUES_KEY, r#"{"issues":[]}"#).unwrap();
        assert_eq!(
            store.read(ISSUES_KEY).unwrap().as_deref(),
            Some(r#"{"issues":[]}"#)
        );
        assert!(dir.path().join("nested").join("issues.json").exists());
        assert!(!dir.path().join("nested").join("issues.json.tmp").exists());
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.write("../escape", "x").unwrap();
        assert!(dir.path().join("___escape.json").exists());
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        let mut table = BTreeMap::new();
        table.insert("a".to_string(), "b".to_string());
        write_json(&store, IMAGE_CACHE_KEY, &table).unwrap();

        let back: Option<BTreeMap<String, String>> = read_json(&store, IMAGE_CACHE_KEY).unwrap();
        assert_eq!(back, Some(table));
    }

    #[test]
    fn test_read_json_reports_corrupt_value() {
        let store = MemoryStore::new();
        store.write(ISSUES_KEY, "{not json").unwrap();
        let res: Result<Option<serde_json::Value>, _> = read_json(&store, ISSUES_KEY);
        assert!(matches!(res, Err(StorageError::Corrupt { .. })));
    }
}
