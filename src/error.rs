use crate::validation::ValidationError;

/// Errors surfaced by the console client.
///
/// The `Display` text of [`Error::Unauthenticated`] and [`Error::SessionExpired`]
/// is fixed: front ends show tailored guidance for them, and a session expiry
/// means a redirect to the login route is imminent.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No stored session; the request was never sent.
    #[error("Usuário não autenticado")]
    Unauthenticated,

    /// The access token was rejected and could not be renewed. The session
    /// has already been cleared.
    #[error("Sessão expirada")]
    SessionExpired,

    /// Refresh succeeded but the renewed session could not be read back.
    #[error("Erro ao obter novos tokens")]
    TokensUnavailable,

    /// Non-2xx response after any retry.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// 2xx response whose body reports `success: false`.
    #[error("{0}")]
    Rejected(String),

    /// Response body did not match the expected shape.
    #[error("invalid response from {endpoint}: {detail}")]
    Decode { endpoint: String, detail: String },

    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure from a non-reqwest [`HttpTransport`](crate::HttpTransport).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl Error {
    /// `true` for errors that mean the user has to log in again.
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::SessionExpired)
    }

    /// HTTP status of the final response, when there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
