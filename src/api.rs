use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::client::ConsoleClient;
use crate::error::Error;
use crate::refresh::RefreshOutcome;
use crate::session::SessionRepository;
use crate::transport::{HttpResponse, HttpTransport, Method};
use crate::wire;

const UNAUTHORIZED: u16 = 401;

/// Options for [`ConsoleClient::call`]. Defaults to an authenticated `GET`
/// without a body.
#[derive(Debug, Clone)]
pub struct CallOptions {
    pub(crate) method: Method,
    pub(crate) body: Option<JsonValue>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) require_auth: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            method: Method::Get,
            body: None,
            headers: Vec::new(),
            require_auth: true,
        }
    }
}

impl CallOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn post(body: JsonValue) -> Self {
        Self::default().with_method(Method::Post).with_body(body)
    }

    #[must_use]
    pub fn put(body: JsonValue) -> Self {
        Self::default().with_method(Method::Put).with_body(body)
    }

    #[must_use]
    pub fn delete() -> Self {
        Self::default().with_method(Method::Delete)
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON request body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if `body` cannot be represented as JSON.
    pub fn with_json<B: Serialize>(self, body: &B) -> Result<Self, Error> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    /// Extra header; replaces a default of the same name.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Send without a bearer token and without refresh-on-401.
    #[must_use]
    pub fn public(self) -> Self {
        self.with_require_auth(false)
    }

    #[must_use]
    pub fn with_require_auth(mut self, require_auth: bool) -> Self {
        self.require_auth = require_auth;
        self
    }
}

impl<T: HttpTransport, S: SessionRepository> ConsoleClient<T, S> {
    /// Call an API endpoint and return its JSON body.
    ///
    /// Authenticated calls attach the stored access token; a `401` triggers one
    /// token refresh and, if it succeeds, exactly one retry with the new token.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthenticated`] if auth is required and no session is stored
    /// - [`Error::SessionExpired`] if the token was rejected and refresh failed
    /// - [`Error::Api`] for a non-2xx final response
    /// - transport and decode errors as they occur; they are never retried
    pub async fn call(&self, endpoint: &str, options: CallOptions) -> Result<JsonValue, Error> {
        let result = self.dispatch(endpoint, &options).await;
        if let Err(e) = &result {
            tracing::warn!(endpoint, method = %options.method, error = %e, "API call failed");
        }
        result
    }

    /// [`call`](Self::call), then deserialize the body into `R`.
    ///
    /// # Errors
    ///
    /// Everything [`call`](Self::call) returns, plus [`Error::Decode`] when
    /// the body does not match `R`.
    pub async fn call_json<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: CallOptions,
    ) -> Result<R, Error> {
        let body = self.call(endpoint, options).await?;
        wire::decode_value(endpoint, body)
    }

    async fn dispatch(&self, endpoint: &str, options: &CallOptions) -> Result<JsonValue, Error> {
        let response = if options.require_auth {
            let session = self.active_session()?;
            let access_token = session.tokens.access_token;
            let response = self.send_call(endpoint, options, Some(&access_token)).await?;

            if response.status == UNAUTHORIZED {
                tracing::debug!(endpoint, "Access token rejected, refreshing");
                match self.refresh_rejected(&access_token).await {
                    RefreshOutcome::Renewed => {
                        let renewed = self
                            .inner
                            .sessions
                            .load()
                            .filter(|record| record.is_authenticated())
                            .ok_or(Error::TokensUnavailable)?;
                        self.send_call(endpoint, options, Some(&renewed.tokens.access_token))
                            .await?
                    }
                    RefreshOutcome::Failed => return Err(Error::SessionExpired),
                }
            } else {
                response
            }
        } else {
            self.send_call(endpoint, options, None).await?
        };

        interpret(endpoint, &response)
    }

    async fn send_call(
        &self,
        endpoint: &str,
        options: &CallOptions,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, Error> {
        self.send_json(
            options.method,
            endpoint,
            options.body.as_ref(),
            &options.headers,
            bearer,
        )
        .await
    }
}

/// JSON body of a 2xx response, or an [`Error::Api`] carrying the best
/// message the body offers.
fn interpret(endpoint: &str, response: &HttpResponse) -> Result<JsonValue, Error> {
    let parsed = if response.body.iter().all(u8::is_ascii_whitespace) {
        Ok(JsonValue::Null)
    } else {
        serde_json::from_slice::<JsonValue>(&response.body)
    };

    if response.is_success() {
        return parsed.map_err(|e| Error::Decode {
            endpoint: endpoint.to_owned(),
            detail: e.to_string(),
        });
    }

    let message = parsed
        .ok()
        .as_ref()
        .and_then(wire::error_message)
        .unwrap_or_else(|| format!("Erro HTTP: {}", response.status));
    Err(Error::Api {
        status: response.status,
        message,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::auth::LOGOUT_ENDPOINT;
    use crate::refresh::REFRESH_ENDPOINT;
    use crate::test_support::{self, assert_method, tokens_body};

    #[tokio::test]
    async fn test_authenticated_call_attaches_bearer() {
        let (client, transport) = test_support::logged_in_client();
        transport.reply("/users", 200, json!({"success": true, "data": []}));

        let body = client.call("/users", CallOptions::get()).await.unwrap();

        assert_eq!(body, json!({"success": true, "data": []}));
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_method(&sent[0], Method::Get);
        assert_eq!(sent[0].url.as_str(), "http://api.test/users");
        assert_eq!(sent[0].header("Authorization"), Some("Bearer T1"));
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn test_missing_session_fails_without_network() {
        let (client, transport) = test_support::client();

        let err = client.call("/users", CallOptions::get()).await.unwrap_err();

        assert!(matches!(err, Error::Unauthenticated));
        assert_eq!(err.to_string(), "Usuário não autenticado");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_401_refreshes_and_retries_once_with_new_token() {
        let (client, transport) = test_support::logged_in_client();
        transport
            .reply("/users", 401, json!({"message": "Token expirado"}))
            .reply(
                REFRESH_ENDPOINT,
                200,
                json!({"success": true, "tokens": tokens_body("T2", "R2")}),
            )
            .reply("/users", 200, json!({"success": true, "data": [{"CodUsu": 1}]}));

        let body = client.call("/users", CallOptions::get()).await.unwrap();

        assert_eq!(body["data"][0]["CodUsu"], 1);
        let calls = transport.requests_to("/users");
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].header("Authorization"), Some("Bearer T1"));
        assert_eq!(calls[1].header("Authorization"), Some("Bearer T2"));
        assert_eq!(transport.requests_to(REFRESH_ENDPOINT).len(), 1);

        let order: Vec<String> = transport
            .requests()
            .iter()
            .map(|r| r.url.path().to_owned())
            .collect();
        assert_eq!(order, ["/users", REFRESH_ENDPOINT, "/users"]);
    }

    #[tokio::test]
    async fn test_retry_returns_retried_failure_without_second_refresh() {
        let (client, transport) = test_support::logged_in_client();
        transport
            .reply("/users", 401, json!({}))
            .reply(
                REFRESH_ENDPOINT,
                200,
                json!({"success": true, "tokens": tokens_body("T2", "R2")}),
            )
            .reply("/users", 401, json!({"message": "Acesso negado"}));

        let err = client.call("/users", CallOptions::get()).await.unwrap_err();

        assert!(matches!(err, Error::Api { status: 401, ref message } if message == "Acesso negado"));
        assert_eq!(transport.requests_to("/users").len(), 2);
        assert_eq!(transport.requests_to(REFRESH_ENDPOINT).len(), 1);
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_failed_refresh_surfaces_session_expired() {
        let (client, transport) = test_support::logged_in_client();
        let mut events = client.subscribe();
        transport
            .reply("/users", 401, json!({}))
            .reply(REFRESH_ENDPOINT, 401, json!({"success": false, "logout": true}))
            .reply(LOGOUT_ENDPOINT, 200, json!({"success": true}));

        let err = client.call("/users", CallOptions::get()).await.unwrap_err();

        assert!(matches!(err, Error::SessionExpired));
        assert_eq!(err.to_string(), "Sessão expirada");
        assert!(client.sessions().load().is_none());
        assert_eq!(transport.requests_to("/users").len(), 1);
        assert!(matches!(
            events.try_recv().unwrap(),
            crate::SessionEvent::LoggedOut { .. }
        ));
    }

    #[tokio::test]
    async fn test_public_call_never_sends_token_or_refreshes() {
        let (client, transport) = test_support::logged_in_client();
        transport.reply("/users", 401, json!({"error": "Não autorizado"}));

        let err = client
            .call("/users", CallOptions::post(json!({"nomeUsu": "Bia"})).public())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Api { status: 401, ref message } if message == "Não autorizado"));
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].header("Authorization"), None);
        assert!(transport.requests_to(REFRESH_ENDPOINT).is_empty());
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_public_call_works_without_session() {
        let (client, transport) = test_support::client();
        transport.reply("/users", 201, json!({"success": true, "userId": "7"}));

        let body = client
            .call("/users", CallOptions::post(json!({"nomeUsu": "Bia"})).public())
            .await
            .unwrap();

        assert_eq!(body["userId"], "7");
        assert_eq!(
            test_support::body_json(&transport.requests()[0]),
            json!({"nomeUsu": "Bia"})
        );
    }

    #[tokio::test]
    async fn test_non_401_error_is_not_retried() {
        let (client, transport) = test_support::logged_in_client();
        transport.reply("/users/9", 500, json!({"message": "Falha no banco"}));

        let err = client
            .call("/users/9", CallOptions::delete())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Falha no banco");
        assert_eq!(err.status(), Some(500));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_error_without_json_body_uses_status_fallback() {
        let (client, transport) = test_support::logged_in_client();
        transport.reply_raw("/users", 503, "Service Unavailable");

        let err = client.call("/users", CallOptions::get()).await.unwrap_err();

        assert_eq!(err.to_string(), "Erro HTTP: 503");
    }

    #[tokio::test]
    async fn test_network_failure_propagates_without_refresh() {
        let (client, transport) = test_support::logged_in_client();
        transport.fail("/users", "connection refused");

        let err = client.call("/users", CallOptions::get()).await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(transport.requests().len(), 1);
        assert!(client.is_authenticated());
    }

    #[tokio::test]
    async fn test_success_with_non_json_body_is_decode_error() {
        let (client, transport) = test_support::logged_in_client();
        transport.reply_raw("/users", 200, "<html></html>");

        let err = client.call("/users", CallOptions::get()).await.unwrap_err();

        assert!(matches!(err, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn test_empty_success_body_is_null() {
        let (client, transport) = test_support::logged_in_client();
        transport.reply_raw("/users/3", 204, "");

        let body = client.call("/users/3", CallOptions::delete()).await.unwrap();

        assert_eq!(body, JsonValue::Null);
    }

    #[tokio::test]
    async fn test_custom_headers_override_defaults() {
        let (client, transport) = test_support::logged_in_client();
        transport.reply("/users", 200, json!({}));

        client
            .call(
                "/users",
                CallOptions::get()
                    .with_header("content-type", "application/json; charset=utf-8")
                    .with_header("X-Request-Id", "abc"),
            )
            .await
            .unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(
            sent.header("Content-Type"),
            Some("application/json; charset=utf-8")
        );
        assert_eq!(sent.header("x-request-id"), Some("abc"));
        assert_eq!(
            sent.headers
                .iter()
                .filter(|(n, _)| n.eq_ignore_ascii_case("content-type"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let (client, transport) = test_support::logged_in_client();
        transport
            .reply("/users", 401, json!({}))
            .reply("/users", 401, json!({}))
            .reply("/users", 200, json!({"ok": 1}))
            .reply("/users", 200, json!({"ok": 1}))
            .reply(
                REFRESH_ENDPOINT,
                200,
                json!({"success": true, "tokens": tokens_body("T2", "R2")}),
            );

        let (a, b) = tokio::join!(
            client.call("/users", CallOptions::get()),
            client.call("/users", CallOptions::get()),
        );

        assert_eq!(a.unwrap(), json!({"ok": 1}));
        assert_eq!(b.unwrap(), json!({"ok": 1}));
        assert_eq!(transport.requests_to(REFRESH_ENDPOINT).len(), 1);

        let retries: Vec<_> = transport.requests_to("/users")[2..]
            .iter()
            .map(|r| r.header("Authorization").map(str::to_owned))
            .collect();
        assert_eq!(
            retries,
            vec![Some("Bearer T2".to_owned()), Some("Bearer T2".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_concurrent_401s_after_failed_refresh_both_expire() {
        let (client, transport) = test_support::logged_in_client();
        transport
            .reply("/users", 401, json!({}))
            .reply("/users", 401, json!({}))
            .reply(REFRESH_ENDPOINT, 401, json!({"success": false, "logout": true}))
            .reply(LOGOUT_ENDPOINT, 200, json!({"success": true}));

        let (a, b) = tokio::join!(
            client.call("/users", CallOptions::get()),
            client.call("/users", CallOptions::get()),
        );

        assert!(matches!(a, Err(Error::SessionExpired)));
        assert!(matches!(b, Err(Error::SessionExpired)));
        assert_eq!(transport.requests_to(REFRESH_ENDPOINT).len(), 1);
        assert!(client.sessions().load().is_none());
    }

    #[tokio::test]
    async fn test_call_json_decodes_typed_body() {
        #[derive(Debug, serde::Deserialize)]
        struct Count {
            total: u32,
        }

        let (client, transport) = test_support::logged_in_client();
        transport.reply("/users", 200, json!({"total": 12}));

        let count: Count = client.call_json("/users", CallOptions::get()).await.unwrap();
        assert_eq!(count.total, 12);

        transport.reply("/users", 200, json!({"total": "twelve"}));
        let err = client
            .call_json::<Count>("/users", CallOptions::get())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
