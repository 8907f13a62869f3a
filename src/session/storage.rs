use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::traits::{KeyValueStorage, SessionRepository};
use crate::error::Error;
use crate::types::SessionRecord;

/// Key holding the serialized `{user, tokens}` record.
pub const SESSION_KEY: &str = "rialma_user_data";

/// Pre-token format (user only). Removed on clear, never read.
pub const LEGACY_SESSION_KEY: &str = "rialma_user";

/// [`SessionRepository`] backed by a [`KeyValueStorage`].
pub struct StorageSessionRepository<K> {
    storage: K,
    key: String,
    legacy_key: String,
}

impl<K: KeyValueStorage> StorageSessionRepository<K> {
    #[must_use]
    pub fn new(storage: K) -> Self {
        Self {
            storage,
            key: SESSION_KEY.into(),
            legacy_key: LEGACY_SESSION_KEY.into(),
        }
    }

    /// Override the storage key (default `rialma_user_data`).
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn storage(&self) -> &K {
        &self.storage
    }
}

impl StorageSessionRepository<MemoryStorage> {
    /// Repository over a fresh [`MemoryStorage`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::default())
    }
}

impl<K: KeyValueStorage> SessionRepository for StorageSessionRepository<K> {
    fn load(&self) -> Option<SessionRecord> {
        let raw = match self.storage.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, key = %self.key, "Failed to read stored session");
                return None;
            }
        };
        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, key = %self.key, "Ignoring malformed stored session");
                None
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<(), Error> {
        let raw = serde_json::to_string(record)?;
        self.storage.set_item(&self.key, &raw)
    }

    fn clear(&self) -> Result<(), Error> {
        // Attempt both removals even if the first fails.
        let current = self.storage.remove_item(&self.key);
        let legacy = self.storage.remove_item(&self.legacy_key);
        current.and(legacy)
    }
}

/// Process-local storage. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    fn items(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        self.items().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        self.items().remove(key);
        Ok(())
    }
}

/// Directory-backed storage: one `<key>.json` file per key.
///
/// Writes go to a temporary file that is then renamed over the target, so a
/// reader never observes a half-written record.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
        if !valid {
            return Err(Error::Storage(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(op: &str, path: &Path, e: &std::io::Error) -> Error {
    Error::Storage(format!("{op} {}: {e}", path.display()))
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &path, &e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| io_error("create", &self.dir, &e))?;
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value).map_err(|e| io_error("write", &tmp, &e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_error("rename", &path, &e))
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, &e)),
        }
    }
}
