use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, broadcast};

use crate::config::ClientConfig;
use crate::error::Error;
use crate::session::SessionRepository;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use crate::types::User;

const EVENT_CAPACITY: usize = 16;

/// Session lifecycle notifications for front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionEvent {
    LoggedIn(User),
    TokensRefreshed,
    /// The session was cleared; the front end should navigate to `redirect_to`.
    LoggedOut { redirect_to: String },
}

/// Console API client: authentication, token refresh and authenticated calls
/// against one backend, sharing one session repository.
///
/// Cloning is cheap; clones share the session, the refresh gate and the
/// event channel.
pub struct ConsoleClient<T, S> {
    pub(crate) inner: Arc<Inner<T, S>>,
}

pub(crate) struct Inner<T, S> {
    pub(crate) config: ClientConfig,
    pub(crate) transport: T,
    pub(crate) sessions: S,
    /// Held for the duration of a refresh exchange.
    pub(crate) refresh_gate: Mutex<()>,
    pub(crate) events: broadcast::Sender<SessionEvent>,
}

// Manual Clone: avoid derive adding `T: Clone, S: Clone` bounds.
impl<T, S> Clone for ConsoleClient<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(feature = "http")]
impl<S: SessionRepository> ConsoleClient<crate::transport::ReqwestTransport, S> {
    /// Client on a default `reqwest` transport.
    #[must_use]
    pub fn with_reqwest(config: ClientConfig, sessions: S) -> Self {
        Self::new(config, crate::transport::ReqwestTransport::new(), sessions)
    }
}

impl<T: HttpTransport, S: SessionRepository> ConsoleClient<T, S> {
    #[must_use]
    pub fn new(config: ClientConfig, transport: T, sessions: S) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                sessions,
                refresh_gate: Mutex::new(()),
                events,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn sessions(&self) -> &S {
        &self.inner.sessions
    }

    /// Subscribe to login, refresh and logout notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Build and send one JSON request. `bearer` adds an `Authorization` header.
    pub(crate) async fn send_json(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&serde_json::Value>,
        extra_headers: &[(String, String)],
        bearer: Option<&str>,
    ) -> Result<HttpResponse, Error> {
        let url = self.inner.config.endpoint_url(endpoint)?;

        let mut headers = Vec::with_capacity(extra_headers.len() + 2);
        set_header(&mut headers, "Content-Type", "application/json");
        for (name, value) in extra_headers {
            set_header(&mut headers, name, value);
        }
        if let Some(token) = bearer {
            set_header(&mut headers, "Authorization", &format!("Bearer {token}"));
        }

        let body = body.map(|b| serde_json::to_vec(b)).transpose()?;

        tracing::debug!(%method, endpoint, authenticated = bearer.is_some(), "Sending request");
        self.inner
            .transport
            .send(HttpRequest {
                method,
                url,
                headers,
                body,
            })
            .await
    }

    pub(crate) async fn post_json<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<HttpResponse, Error> {
        let body = serde_json::to_value(body)?;
        self.send_json(Method::Post, endpoint, Some(&body), &[], None)
            .await
    }
}

/// Insert or replace a header, matching names case-insensitively.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    if let Some(slot) = headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
    {
        slot.1 = value.to_owned();
    } else {
        headers.push((name.to_owned(), value.to_owned()));
    }
}
