//! Error types for the request layer.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::error::ErrorCode;

/// Failure of a single transport attempt, before any status handling.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("request could not be built: {0}")]
    Build(String),
}

impl TransportError {
    /// Network failures and timeouts are worth retrying; malformed requests are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Network(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_builder() {
            Self::Build(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

/// Errors produced by [`ApiClient`](super::ApiClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered 401; stored credentials have been cleared.
    #[error("re-authentication required: {message}")]
    Unauthorized { message: String },

    /// Every attempt failed with a transient transport error.
    #[error("request failed after {attempts} attempts: {message}")]
    Unreachable { attempts: usize, message: String },

    /// The backend answered with a non-2xx status other than 401.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The request was rejected locally before reaching the network.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "E_UNAUTHORIZED",
            Self::Unreachable { .. } => "E_UNREACHABLE",
            Self::Status { .. } => "E_STATUS",
            Self::Decode(_) => "E_DECODE",
            Self::InvalidRequest(_) => "E_INVALID_REQUEST",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Status { status: 429 | 500..=599, .. })
    }
}

impl ApiError {
    /// HTTP status carried by the error, if the backend answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}

/// Human-readable message for a non-2xx body: the JSON `message` or `error`
/// field when present, else `HTTP <status>`.
#[must_use]
pub fn status_message(status: u16, body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|field| value.get(*field).and_then(serde_json::Value::as_str).map(str::to_owned))
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"))
}
