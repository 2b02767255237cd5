//! Persistent key/value storage for session, cart and wishlist state.
//!
//! SYSTEM CONTEXT
//! ==============
//! Plays the role browser `localStorage` plays for a web front-end: string
//! values under well-known keys, readable by every component. `FileStorage`
//! persists to a single JSON file; `MemoryStorage` backs tests and
//! short-lived sessions.
//!
//! TRADE-OFFS
//! ==========
//! Every write rewrites the whole file. Two processes sharing one file can
//! overwrite each other's keys; there is no cross-process locking.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("storage encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "E_STORAGE_IO",
            Self::Encode(_) => "E_STORAGE_ENCODE",
        }
    }
}

/// String key/value store shared by the session, cart and wishlist layers.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    fn keys(&self) -> Vec<String>;
}

/// Load a JSON value stored under `key`. Missing or corrupt entries yield `None`.
pub fn load_json<T: DeserializeOwned>(storage: &dyn SessionStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(key, %error, "discarding corrupt stored value");
            None
        }
    }
}

/// Save a JSON value under `key`.
///
/// # Errors
///
/// Returns an error if encoding or persistence fails.
pub fn save_json<T: Serialize>(storage: &dyn SessionStorage, key: &str, value: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

// =============================================================================
// MEMORY
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON-file backed storage. The file holds one flat object of string values.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A missing file starts empty. A corrupt file is logged and treated as
    /// empty; it is replaced on the next write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
                tracing::warn!(path = %path.display(), %error, "storage file corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(source) if source.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io { path: self.path.clone(), source };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_owned(), value.to_owned());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }

    fn keys(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }
}
