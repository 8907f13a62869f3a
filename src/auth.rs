use crate::client::{ConsoleClient, SessionEvent};
use crate::error::Error;
use crate::session::SessionRepository;
use crate::transport::HttpTransport;
use crate::types::{SessionRecord, User};
use crate::wire::{self, LoginReply, LoginRequest, UserCodeBody};

pub(crate) const LOGIN_ENDPOINT: &str = "/users/login";
pub(crate) const LOGOUT_ENDPOINT: &str = "/users/logout";

/// Result of [`ConsoleClient::authenticate`]. Login failures are values, not errors.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    Authenticated(User),
    Rejected(AuthFailure),
}

impl AuthOutcome {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Why a login attempt failed, with a message fit for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthFailure {
    pub kind: AuthFailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthFailureKind {
    /// The server refused the credentials (or replied without a session).
    InvalidCredentials,
    /// The server replied with a body that is not a login response.
    MalformedResponse,
    /// The server could not be reached.
    Connection,
    /// Login succeeded but the session could not be persisted.
    Storage,
}

impl AuthFailure {
    fn new(kind: AuthFailureKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

impl<T: HttpTransport, S: SessionRepository> ConsoleClient<T, S> {
    /// Log in with email and password and persist the session.
    ///
    /// Never fails with an error: every problem is reported as
    /// [`AuthOutcome::Rejected`] and leaves no session behind.
    pub async fn authenticate(&self, email: &str, password: &str) -> AuthOutcome {
        match self.try_authenticate(email, password).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Logged in");
                self.emit(SessionEvent::LoggedIn(user.clone()));
                AuthOutcome::Authenticated(user)
            }
            Err(failure) => {
                tracing::warn!(kind = ?failure.kind, reason = %failure.reason, "Login rejected");
                AuthOutcome::Rejected(failure)
            }
        }
    }

    async fn try_authenticate(&self, email: &str, password: &str) -> Result<User, AuthFailure> {
        let request = LoginRequest {
            email,
            senha: password,
        };
        let response = self
            .post_json(LOGIN_ENDPOINT, &request)
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Login request failed");
                AuthFailure::new(AuthFailureKind::Connection, "Erro de conexão. Tente novamente.")
            })?;

        if !response.is_success() {
            let reason = serde_json::from_slice(&response.body)
                .ok()
                .and_then(|body| wire::error_message(&body))
                .unwrap_or_else(|| "Erro na autenticação".to_owned());
            return Err(AuthFailure::new(AuthFailureKind::InvalidCredentials, reason));
        }

        let reply = LoginReply::parse(&response.body).map_err(|e| {
            tracing::debug!(error = %e, "Unreadable login response");
            AuthFailure::new(
                AuthFailureKind::MalformedResponse,
                "Resposta inválida do servidor",
            )
        })?;

        match reply {
            LoginReply::Granted { user, tokens } => {
                let record = SessionRecord::new(user, tokens);
                self.inner.sessions.save(&record).map_err(|e| {
                    AuthFailure::new(AuthFailureKind::Storage, format!("Erro ao salvar sessão: {e}"))
                })?;
                Ok(record.user)
            }
            LoginReply::Denied { message } => Err(AuthFailure::new(
                AuthFailureKind::InvalidCredentials,
                message.unwrap_or_else(|| "Credenciais inválidas".to_owned()),
            )),
        }
    }

    /// Notify the server (best effort), clear the local session and announce
    /// [`SessionEvent::LoggedOut`]. Safe to call repeatedly.
    pub async fn logout(&self) {
        if let Some(session) = self.inner.sessions.load() {
            let body = UserCodeBody {
                cod_usu: session.user.id,
            };
            match self.post_json(LOGOUT_ENDPOINT, &body).await {
                Ok(response) if !response.is_success() => {
                    tracing::warn!(status = response.status, "Server-side logout refused");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Server-side logout failed"),
            }
        }

        if let Err(e) = self.inner.sessions.clear() {
            tracing::error!(error = %e, "Failed to clear stored session");
        }
        tracing::info!("Logged out");
        self.emit(SessionEvent::LoggedOut {
            redirect_to: self.inner.config.login_route.clone(),
        });
    }

    /// `true` iff a session with a non-empty access token is stored.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .sessions
            .load()
            .is_some_and(|record| record.is_authenticated())
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.inner.sessions.load().map(|record| record.user)
    }

    /// The current user's must-change-password flag; `false` without a session.
    #[must_use]
    pub fn should_change_password(&self) -> bool {
        self.current_user()
            .is_some_and(|user| user.must_change_password)
    }

    /// Stored session, if any, that may be used for authenticated calls.
    pub(crate) fn active_session(&self) -> Result<SessionRecord, Error> {
        self.inner
            .sessions
            .load()
            .filter(SessionRecord::is_authenticated)
            .ok_or(Error::Unauthenticated)
    }
}
