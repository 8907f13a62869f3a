//! Scripted transport and client builders shared by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{Value as JsonValue, json};

use crate::client::ConsoleClient;
use crate::config::ClientConfig;
use crate::error::Error;
use crate::session::{MemoryStorage, SessionRepository, StorageSessionRepository};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};
use crate::types::{SessionRecord, TokenPair, User, UserId};

pub(crate) type TestClient =
    ConsoleClient<Arc<ScriptedTransport>, Arc<StorageSessionRepository<MemoryStorage>>>;

type Reply = Result<HttpResponse, String>;

/// Replies per URL path, in order. Every request is recorded.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn reply(&self, path: &str, status: u16, body: JsonValue) -> &Self {
        self.push(
            path,
            Ok(HttpResponse {
                status,
                body: serde_json::to_vec(&body).unwrap(),
            }),
        )
    }

    pub(crate) fn reply_raw(&self, path: &str, status: u16, body: &str) -> &Self {
        self.push(
            path,
            Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
        )
    }

    pub(crate) fn fail(&self, path: &str, reason: &str) -> &Self {
        self.push(path, Err(reason.to_owned()))
    }

    fn push(&self, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(path.to_owned())
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect()
    }
}

impl HttpTransport for Arc<ScriptedTransport> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let path = request.url.path().to_owned();
        self.requests.lock().unwrap().push(request);
        // Let concurrent callers interleave at the network boundary.
        tokio::task::yield_now().await;
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(Error::Transport(reason)),
            None => Err(Error::Transport(format!("no scripted reply for {path}"))),
        }
    }
}

pub(crate) fn client() -> (TestClient, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::default());
    let sessions = Arc::new(StorageSessionRepository::in_memory());
    let config = ClientConfig::new("http://api.test".parse().unwrap());
    (
        ConsoleClient::new(config, transport.clone(), sessions),
        transport,
    )
}

/// Client with a stored session for user 1 holding `T1`/`R1`.
pub(crate) fn logged_in_client() -> (TestClient, Arc<ScriptedTransport>) {
    let (client, transport) = client();
    client.sessions().save(&session("T1", "R1")).unwrap();
    (client, transport)
}

pub(crate) fn session(access: &str, refresh: &str) -> SessionRecord {
    SessionRecord::new(
        User::new(UserId(1), "a@b.com", "Ana"),
        TokenPair::new(access, refresh).with_expires_in(3600),
    )
}

pub(crate) fn tokens_body(access: &str, refresh: &str) -> JsonValue {
    json!({
        "accessToken": access,
        "refreshToken": refresh,
        "expiresIn": 3600,
        "tokenType": "Bearer"
    })
}

pub(crate) fn body_json(request: &HttpRequest) -> JsonValue {
    serde_json::from_slice(request.body.as_deref().unwrap_or(b"null")).unwrap()
}

pub(crate) fn assert_method(request: &HttpRequest, method: Method) {
    assert_eq!(request.method, method, "unexpected method for {}", request.url);
}
