//! Shared fixtures for unit tests: scripted transports and a wired client.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::{ClientConfig, RetryPolicy};
use crate::http::{ApiClient, HttpRequest, HttpResponse, Transport, TransportError};
use crate::session::{SessionStore, User};
use crate::storage::MemoryStorage;

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Transport that answers through a closure and records every request.
pub struct MockTransport {
    handler: Box<Handler>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self { handler: Box::new(handler), seen: Mutex::new(Vec::new()) })
    }

    /// Replays `outcomes` in order, then times out forever.
    pub fn scripted(outcomes: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
        let outcomes = Mutex::new(outcomes);
        Self::new(move |_| {
            let mut outcomes = outcomes.lock();
            if outcomes.is_empty() { Err(TransportError::Timeout) } else { outcomes.remove(0) }
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().clone()
    }

    pub fn last(&self) -> HttpRequest {
        self.seen.lock().last().cloned().expect("no request recorded")
    }

    /// Paths (URL minus base) of every request, in order.
    pub fn paths(&self) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .map(|r| r.url.trim_start_matches(BASE_URL).to_owned())
            .collect()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.seen.lock().push(request.clone());
        (self.handler)(request)
    }
}

pub const BASE_URL: &str = "http://shop.test/api";

pub fn json_response(status: u16, body: serde_json::Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse { status, body: serde_json::to_vec(&body).expect("json body") })
}

pub fn fast_config(max_retries: usize) -> ClientConfig {
    let mut config = ClientConfig::new(BASE_URL);
    config.retry = RetryPolicy {
        max_retries,
        initial_delay: Duration::from_millis(1),
        factor: 2.0,
        max_delay: Duration::from_secs(1),
    };
    config
}

/// A client over `transport` whose token provider is a fresh session store.
pub fn wired_client(config: &ClientConfig, transport: Arc<MockTransport>) -> (Arc<ApiClient>, Arc<SessionStore>) {
    let storage = Arc::new(MemoryStorage::new());
    let sessions = Arc::new(SessionStore::new(storage, config.token_keys.clone()));
    let api = Arc::new(ApiClient::new(config, transport, sessions.clone()));
    (api, sessions)
}

pub fn sample_user(id: &str, is_admin: bool) -> User {
    User {
        id: id.to_owned(),
        name: format!("User {id}"),
        email: format!("{id}@example.test"),
        is_admin,
        role: None,
        created_at: None,
        phone: None,
        address: None,
    }
}
