use crate::client::{ConsoleClient, SessionEvent};
use crate::error::Error;
use crate::session::SessionRepository;
use crate::transport::HttpTransport;
use crate::types::SessionRecord;
use crate::wire::{RefreshReply, RefreshRequest};

pub(crate) const REFRESH_ENDPOINT: &str = "/users/refresh-token";

/// Result of a refresh attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The stored session now holds a usable token pair.
    Renewed,
    /// The session could not be renewed and has been logged out.
    Failed,
}

impl<T: HttpTransport, S: SessionRepository> ConsoleClient<T, S> {
    /// Exchange the stored refresh token for a new token pair.
    ///
    /// On any failure the session is logged out before returning
    /// [`RefreshOutcome::Failed`].
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(session) = self.inner.sessions.load() else {
            return RefreshOutcome::Failed;
        };
        self.refresh_rejected(&session.tokens.access_token).await
    }

    /// Refresh after the server rejected `rejected_access_token`.
    ///
    /// Refreshes are serialized behind the refresh gate. A caller that gets
    /// through the gate after another caller already replaced the rejected
    /// token reuses that result instead of refreshing again.
    pub(crate) async fn refresh_rejected(&self, rejected_access_token: &str) -> RefreshOutcome {
        let _gate = self.inner.refresh_gate.lock().await;

        let Some(session) = self.inner.sessions.load() else {
            tracing::debug!("Session gone while waiting for refresh");
            return RefreshOutcome::Failed;
        };
        if session.is_authenticated() && session.tokens.access_token != rejected_access_token {
            tracing::debug!("Reusing tokens from a concurrent refresh");
            return RefreshOutcome::Renewed;
        }

        match self.exchange_refresh_token(&session).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.logout().await;
                RefreshOutcome::Failed
            }
        }
    }

    async fn exchange_refresh_token(&self, session: &SessionRecord) -> Result<RefreshOutcome, Error> {
        if session.tokens.refresh_token.is_empty() {
            tracing::info!("No refresh token stored, logging out");
            self.logout().await;
            return Ok(RefreshOutcome::Failed);
        }

        let request = RefreshRequest {
            refresh_token: &session.tokens.refresh_token,
            cod_user: session.user.id,
        };
        let response = self.post_json(REFRESH_ENDPOINT, &request).await?;

        match RefreshReply::parse(&response.body)? {
            RefreshReply::Renewed(tokens) => {
                let renewed = SessionRecord::new(session.user.clone(), tokens);
                self.inner.sessions.save(&renewed)?;
                tracing::info!(user_id = %session.user.id, "Access token refreshed");
                self.emit(SessionEvent::TokensRefreshed);
                Ok(RefreshOutcome::Renewed)
            }
            RefreshReply::ForcedLogout => {
                tracing::info!("Server revoked the session");
                self.logout().await;
                Ok(RefreshOutcome::Failed)
            }
            RefreshReply::Rejected { message } => {
                tracing::info!(
                    status = response.status,
                    message = message.as_deref().unwrap_or(""),
                    "Refresh token rejected"
                );
                self.logout().await;
                Ok(RefreshOutcome::Failed)
            }
        }
    }
}
