//! Client-side session persistence.
//!
//! A session is one [`SessionRecord`](crate::SessionRecord) stored as a JSON
//! blob under a fixed key. The [`SessionRepository`] trait is the seam the
//! client depends on; [`StorageSessionRepository`] implements it on top of any
//! [`KeyValueStorage`], the local-storage analogue.
//!
//! ```rust,ignore
//! use rialma_console::session::{FileStorage, StorageSessionRepository};
//!
//! let sessions = StorageSessionRepository::new(FileStorage::new(".rialma"));
//! if let Some(record) = sessions.load() {
//!     println!("logged in as {}", record.user.email);
//! }
//! ```

mod storage;
mod traits;

pub use storage::{
    FileStorage, LEGACY_SESSION_KEY, MemoryStorage, SESSION_KEY, StorageSessionRepository,
};
pub use traits::{KeyValueStorage, SessionRepository};
