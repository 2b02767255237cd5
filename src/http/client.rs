//! JSON request layer with retry, bearer auth and 401 invalidation.
//!
//! ARCHITECTURE
//! ============
//! `ApiClient::request` resolves the endpoint against the base URL, attaches
//! JSON headers and the bearer token from the injected `TokenProvider`, then
//! drives the transport under `backon` exponential backoff.
//!
//! ERROR HANDLING
//! ==============
//! Only transport failures (network errors, timeouts) are retried. Any HTTP
//! response, including 5xx, ends the retry loop. A 401 invalidates the token
//! provider before the error is returned, so the next request goes out
//! unauthenticated and callers must log in again.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use backon::Retryable;
use reqwest::Method;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::error::{ApiError, TransportError, status_message};
use super::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::config::{ClientConfig, RetryPolicy};
use crate::token::TokenProvider;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Per-request options. `Default` is an authenticated, retried `GET`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
    pub no_cache: bool,
    pub anonymous: bool,
    pub no_retry: bool,
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn post(body: serde_json::Value) -> Self {
        Self { method: Method::POST, body: Some(body), ..Self::default() }
    }

    #[must_use]
    pub fn put(body: serde_json::Value) -> Self {
        Self { method: Method::PUT, body: Some(body), ..Self::default() }
    }

    #[must_use]
    pub fn delete() -> Self {
        Self { method: Method::DELETE, ..Self::default() }
    }

    #[must_use]
    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Ask intermediaries for a fresh copy.
    #[must_use]
    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Send without an `Authorization` header.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Make exactly one attempt.
    #[must_use]
    pub fn no_retry(mut self) -> Self {
        self.no_retry = true;
        self
    }
}

pub struct ApiClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    base_url: String,
    retry: RetryPolicy,
    timeout: Duration,
}

impl ApiClient {
    #[must_use]
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            transport,
            tokens,
            base_url: config.base_url.clone(),
            retry: config.retry,
            timeout: config.timeouts.request,
        }
    }

    /// Build a client backed by `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ApiError> {
        let transport = ReqwestTransport::new(config.timeouts.connect)?;
        Ok(Self::new(config, Arc::new(transport), tokens))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Absolute URL for `endpoint`. Absolute endpoints pass through unchanged.
    #[must_use]
    pub fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_owned();
        }
        let path = endpoint.trim_start_matches('/');
        format!("{}/{path}", self.base_url)
    }

    /// Send a request and decode the JSON body as `T`.
    ///
    /// An empty body decodes as JSON `null`, so `T = ()` and `Option<_>` work
    /// for endpoints that answer 204.
    ///
    /// # Errors
    ///
    /// See [`ApiError`]; a 401 also clears the token provider.
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &str, options: RequestOptions) -> Result<T, ApiError> {
        let response = self.execute(endpoint, options).await?;
        decode_body(&response.body)
    }

    /// Send a request and return the raw body (e.g. CSV exports).
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn request_bytes(&self, endpoint: &str, options: RequestOptions) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(endpoint, options).await?;
        Ok(response.body)
    }

    fn build_request(&self, endpoint: &str, options: &RequestOptions) -> HttpRequest {
        let mut headers = vec![
            ("Content-Type".to_owned(), "application/json".to_owned()),
            ("Accept".to_owned(), "application/json".to_owned()),
            (REQUEST_ID_HEADER.to_owned(), Uuid::new_v4().to_string()),
        ];
        if options.no_cache {
            headers.push(("Cache-Control".to_owned(), "no-cache".to_owned()));
            headers.push(("Pragma".to_owned(), "no-cache".to_owned()));
        }
        if !options.anonymous {
            if let Some(bearer) = self.tokens.bearer_token() {
                headers.push(("Authorization".to_owned(), bearer));
            }
        }
        HttpRequest {
            method: options.method.clone(),
            url: self.url(endpoint),
            query: options.query.clone(),
            headers,
            body: options.body.clone(),
            timeout: options.timeout.unwrap_or(self.timeout),
        }
    }

    async fn execute(&self, endpoint: &str, options: RequestOptions) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(endpoint, &options);
        let backoff = if options.no_retry {
            self.retry.backoff().with_max_times(0)
        } else {
            self.retry.backoff()
        };
        let attempts = AtomicUsize::new(0);

        let result = (|| async {
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(attempt, method = %request.method, url = %request.url, "sending request");
            self.transport.send(&request).await
        })
        .retry(backoff)
        .when(TransportError::is_transient)
        .notify(|error, delay| {
            tracing::warn!(%error, ?delay, url = %request.url, "transient request failure, retrying");
        })
        .await;

        let attempts = attempts.load(Ordering::Relaxed);
        let response = match result {
            Ok(response) => response,
            Err(error) if error.is_transient() => {
                tracing::error!(%error, attempts, url = %request.url, "request failed after retries");
                return Err(ApiError::Unreachable { attempts, message: error.to_string() });
            }
            Err(error) => return Err(ApiError::InvalidRequest(error.to_string())),
        };

        if response.status == 401 {
            tracing::warn!(url = %request.url, "backend answered 401, clearing stored session");
            self.tokens.invalidate();
            return Err(ApiError::Unauthorized { message: status_message(401, &response.body) });
        }
        if !response.is_success() {
            let message = status_message(response.status, &response.body);
            tracing::debug!(status = response.status, %message, url = %request.url, "request rejected");
            return Err(ApiError::Status { status: response.status, message });
        }
        Ok(response)
    }
}

fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) { b"null".as_slice() } else { body };
    serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))
}
