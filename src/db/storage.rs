use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Ratings,
    Reviews,
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::Ratings => write!(f, "user_ratings_v1"),
            StorageKey::Reviews => write!(f, "user_reviews_v1"),
        }
    }
}

/// Flat string-keyed, string-valued storage with synchronous access
///
/// Mirrors the browser's origin-scoped local storage. Backends are swappable
/// without touching the stores built on top.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &StorageKey) -> AppResult<Option<String>>;

    fn set(&self, key: &StorageKey, value: String) -> AppResult<()>;
}

/// Process-local storage, used in tests and for ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw value, bypassing any store-level validation.
    pub fn with_raw(key: &StorageKey, value: impl Into<String>) -> Self {
        let storage = Self::new();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.to_string(), value.into());
        }
        storage
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &StorageKey) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| AppError::Storage(format!("Memory storage lock poisoned: {}", e)))?;
        Ok(entries.get(&key.to_string()).cloned())
    }

    fn set(&self, key: &StorageKey, value: String) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AppError::Storage(format!("Memory storage lock poisoned: {}", e)))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Storage backed by a single JSON object file
///
/// Every `set` rewrites the whole file through a sibling temp file and a
/// rename, so readers never observe a half-written document.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> AppResult<Map<String, Value>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) | Err(_) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Storage file is not a JSON object, starting from an empty document"
                );
                Ok(Map::new())
            }
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &StorageKey) -> AppResult<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| AppError::Storage(format!("File storage lock poisoned: {}", e)))?;
        let document = self.read_document()?;
        Ok(document
            .get(&key.to_string())
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    fn set(&self, key: &StorageKey, value: String) -> AppResult<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| AppError::Storage(format!("File storage lock poisoned: {}", e)))?;
        let mut document = self.read_document()?;
        document.insert(key.to_string(), Value::String(value));

        let json = serde_json::to_string_pretty(&Value::Object(document))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(key = %key, path = %self.path.display(), "Persisted storage key");
        Ok(())
    }
}
