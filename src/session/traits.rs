use std::sync::Arc;

use crate::error::Error;
use crate::types::SessionRecord;

/// Session persistence used by the console client.
///
/// Implementations must treat unreadable or partial data as "no session":
/// `load` never fails.
///
/// # Example
///
/// ```rust,ignore
/// struct KeyringSessions { entry: keyring::Entry }
///
/// impl SessionRepository for KeyringSessions {
///     fn load(&self) -> Option<SessionRecord> {
///         let raw = self.entry.get_password().ok()?;
///         serde_json::from_str(&raw).ok()
///     }
///
///     fn save(&self, record: &SessionRecord) -> Result<(), Error> {
///         let raw = serde_json::to_string(record)?;
///         self.entry.set_password(&raw).map_err(|e| Error::Storage(e.to_string()))
///     }
///
///     fn clear(&self) -> Result<(), Error> {
///         let _ = self.entry.delete_credential();
///         Ok(())
///     }
/// }
/// ```
pub trait SessionRepository: Send + Sync + 'static {
    /// Current session, or `None` if absent or malformed.
    fn load(&self) -> Option<SessionRecord>;

    /// Overwrite the stored session in a single write.
    fn save(&self, record: &SessionRecord) -> Result<(), Error>;

    /// Remove the session (and any legacy entry). Idempotent.
    fn clear(&self) -> Result<(), Error>;
}

impl<S: SessionRepository> SessionRepository for Arc<S> {
    fn load(&self) -> Option<SessionRecord> {
        (**self).load()
    }

    fn save(&self, record: &SessionRecord) -> Result<(), Error> {
        (**self).save(record)
    }

    fn clear(&self) -> Result<(), Error> {
        (**self).clear()
    }
}

/// String key/value storage with browser local-storage semantics.
///
/// Removing a missing key is not an error.
pub trait KeyValueStorage: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;

    fn remove_item(&self, key: &str) -> Result<(), Error>;
}
