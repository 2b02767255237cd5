//! Authentication: backend login/register, fallback sessions, admin setup.

pub mod fallback;
pub mod service;
pub mod setup;

pub use fallback::{AuthMode, FallbackAuthenticator};
pub use service::{AdminLogin, AuthService};
pub use setup::{AdminCredentials, AdminProbe};

use crate::error::ErrorCode;
use crate::http::ApiError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Input rejected before any request was made.
    #[error("{0}")]
    Validation(String),

    /// The backend answered 2xx without a usable token and user.
    #[error("Invalid response from server")]
    InvalidResponse,

    #[error("Access denied. Admin privileges required.")]
    AccessDenied,

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("fallback authentication is disabled")]
    FallbackDisabled,

    #[error("backend is reachable; fallback authentication not allowed")]
    BackendReachable,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ErrorCode for AuthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::InvalidResponse => "E_INVALID_RESPONSE",
            Self::AccessDenied => "E_ACCESS_DENIED",
            Self::InvalidCredentials(_) => "E_INVALID_CREDENTIALS",
            Self::FallbackDisabled => "E_FALLBACK_DISABLED",
            Self::BackendReachable => "E_BACKEND_REACHABLE",
            Self::Api(error) => error.error_code(),
            Self::Storage(error) => error.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(error) => error.retryable(),
            _ => false,
        }
    }
}
