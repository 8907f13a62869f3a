#![doc = include_str!("../README.md")]

mod api;
mod auth;
mod client;
pub mod config;
pub mod error;
mod permissions;
mod refresh;
pub mod session;
pub mod transport;
pub mod types;
mod users;
pub mod validation;
mod wire;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use api::CallOptions;
pub use auth::{AuthFailure, AuthFailureKind, AuthOutcome};
pub use client::{ConsoleClient, SessionEvent};
pub use config::ClientConfig;
pub use error::Error;
pub use permissions::{Group, NewGroup};
pub use refresh::RefreshOutcome;
pub use session::{
    FileStorage, KeyValueStorage, MemoryStorage, SessionRepository, StorageSessionRepository,
};
#[cfg(feature = "http")]
pub use transport::ReqwestTransport;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method};
pub use types::{Flag, Role, SessionRecord, TokenPair, User, UserId};
pub use users::{
    CreatedUser, DEFAULT_EXTENSION, DEFAULT_PHONE, NewUser, UserPage, UserSummary, UserUpdate,
};
pub use validation::ValidationError;
