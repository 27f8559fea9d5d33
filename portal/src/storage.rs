//! Persisted client-side storage: a local key-value store plus a cookie jar.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session store writes the identity to both places on login and clears
//! both on logout. [`MemoryStore`] backs tests and the server; [`FileStore`]
//! backs the CLI so a session survives process restarts.

use std::collections::{BTreeMap, HashMap};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::cookie::SessionCookie;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("storage file {path} is not valid JSON: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Browser-style local storage.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Cookie jar that honours max-age and deletion.
pub trait CookieMirror: Send + Sync {
    /// Store `cookie`; an expired cookie deletes any existing one of that name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn write_cookie(&self, cookie: &SessionCookie) -> Result<(), StorageError>;

    /// Current value of the named cookie, `None` once it has expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn read_cookie(&self, name: &str) -> Result<Option<String>, StorageError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct StoredCookie {
    value: String,
    path: String,
    /// Unix seconds.
    expires_at: i64,
}

impl StoredCookie {
    fn from_session_cookie(cookie: &SessionCookie, now: OffsetDateTime) -> Option<Self> {
        let max_age = cookie.max_age?;
        Some(Self { value: cookie.value.clone(), path: cookie.path.to_owned(), expires_at: (now + max_age).unix_timestamp() })
    }

    fn live_value(&self, now: OffsetDateTime) -> Option<&str> {
        (self.expires_at > now.unix_timestamp()).then_some(self.value.as_str())
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Default)]
struct MemoryInner {
    local: HashMap<String, String>,
    cookies: HashMap<String, StoredCookie>,
}

/// In-process store. Contents vanish with the value.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut MemoryInner) -> R) -> R {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.with_inner(|inner| inner.local.get(key).cloned()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_inner(|inner| inner.local.insert(key.to_owned(), value.to_owned()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_inner(|inner| inner.local.remove(key));
        Ok(())
    }
}

impl CookieMirror for MemoryStore {
    fn write_cookie(&self, cookie: &SessionCookie) -> Result<(), StorageError> {
        let stored = StoredCookie::from_session_cookie(cookie, OffsetDateTime::now_utc());
        self.with_inner(|inner| match stored {
            Some(stored) => inner.cookies.insert(cookie.name.to_owned(), stored),
            None => inner.cookies.remove(cookie.name),
        });
        Ok(())
    }

    fn read_cookie(&self, name: &str) -> Result<Option<String>, StorageError> {
        let now = OffsetDateTime::now_utc();
        Ok(self.with_inner(|inner| {
            inner
                .cookies
                .get(name)
                .and_then(|c| c.live_value(now))
                .map(str::to_owned)
        }))
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    local: BTreeMap<String, String>,
    #[serde(default)]
    cookies: BTreeMap<String, StoredCookie>,
}

/// JSON-file store. Every operation is a read-modify-write of the whole file.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io { path: self.path.clone(), source }
    }

    fn load(&self) -> Result<StoreFile, StorageError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreFile::default()),
            Err(e) => return Err(self.io_error(e)),
        };
        if raw.trim().is_empty() {
            return Ok(StoreFile::default());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Format { path: self.path.clone(), source })
    }

    fn save(&self, file: &StoreFile) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let raw = serde_json::to_string_pretty(file)
            .map_err(|source| StorageError::Format { path: self.path.clone(), source })?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn update<R>(&self, f: impl FnOnce(&mut StoreFile) -> R) -> Result<R, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut file = self.load()?;
        let out = f(&mut file);
        self.save(&file)?;
        Ok(out)
    }

    fn read<R>(&self, f: impl FnOnce(&StoreFile) -> R) -> Result<R, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let file = self.load()?;
        Ok(f(&file))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.read(|file| file.local.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|file| {
            file.local.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|file| {
            file.local.remove(key);
        })
    }
}

impl CookieMirror for FileStore {
    fn write_cookie(&self, cookie: &SessionCookie) -> Result<(), StorageError> {
        let stored = StoredCookie::from_session_cookie(cookie, OffsetDateTime::now_utc());
        self.update(|file| match stored {
            Some(stored) => {
                file.cookies.insert(cookie.name.to_owned(), stored);
            }
            None => {
                file.cookies.remove(cookie.name);
            }
        })
    }

    fn read_cookie(&self, name: &str) -> Result<Option<String>, StorageError> {
        let now = OffsetDateTime::now_utc();
        self.read(|file| {
            file.cookies
                .get(name)
                .and_then(|c| c.live_value(now))
                .map(str::to_owned)
        })
    }
}

#[cfg(test)]
#[path = "storage_test.rs"]
mod tests;
