//! Device storage: small string values keyed by name, kept on the device.
//!
//! [`DeviceStorage`] is the raw key-value seam. [`Namespaced`] puts every
//! key under one prefix (`limarose_` by default) and stores values as JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors from device storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),

    #[error("storage I/O failed for {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A string key-value store that survives restarts of the client.
pub trait DeviceStorage: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys end up in file names, so only a conservative alphabet is allowed.
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl DeviceStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Write then rename so a crash never leaves half a value behind.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(io_err)?;
        std::fs::rename(&tmp, &path).map_err(io_err)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(StorageError::Io {
                key: key.to_string(),
                source: e,
            }),
            _ => Ok(()),
        }
    }
}

/// In-process storage, for tests and short-lived clients.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = values.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl DeviceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// JSON values under a shared key prefix.
#[derive(Debug)]
pub struct Namespaced<S> {
    inner: S,
    prefix: String,
}

impl<S: DeviceStorage> Namespaced<S> {
    #[must_use]
    pub fn new(inner: S, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    /// The full key a short name is stored under.
    #[must_use]
    pub fn key(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Load a value. A stored value that no longer parses is treated as
    /// absent, since the client can always start over.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StorageError> {
        let key = self.key(name);
        let Some(raw) = self.inner.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable stored value");
                Ok(None)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be encoded or written.
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StorageError> {
        let key = self.key(name);
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.clone(),
            source,
        })?;
        self.inner.set(&key, &raw)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    pub fn remove(&self, name: &str) -> Result<(), StorageError> {
        self.inner.remove(&self.key(name))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("limarose-storage-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("limarose_cart").unwrap(), None);
        storage.set("limarose_cart", "[]").unwrap();
        assert_eq!(storage.get("limarose_cart").unwrap().as_deref(), Some("[]"));
        storage.remove("limarose_cart").unwrap();
        storage.remove("limarose_cart").unwrap();
        assert_eq!(storage.get("limarose_cart").unwrap(), None);
    }

    #[test]
    fn test_keys_are_validated() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.set("../etc/passwd", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(storage.get("").is_err());
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = temp_dir();
        FileStorage::new(&dir).set("limarose_cart", "[1]").unwrap();

        let reopened = FileStorage::new(&dir);
        assert_eq!(reopened.get("limarose_cart").unwrap().as_deref(), Some("[1]"));
        reopened.remove("limarose_cart").unwrap();
        assert_eq!(reopened.get("limarose_cart").unwrap(), None);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn test_namespaced_prefixes_keys() {
        let storage = Namespaced::new(MemoryStorage::new(), "limarose_");
        storage.save("cart", &vec![1, 2, 3]).unwrap();
        assert_eq!(storage.inner().keys(), vec!["limarose_cart".to_string()]);
        assert_eq!(storage.load::<Vec<i32>>("cart").unwrap(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_namespaced_discards_corrupt_values() {
        let storage = Namespaced::new(MemoryStorage::new(), "limarose_");
        storage.inner().set("limarose_cart", "{not json").unwrap();
        assert_eq!(storage.load::<Vec<i32>>("cart").unwrap(), None);
    }
}
