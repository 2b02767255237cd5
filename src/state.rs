//! Wired client state.
//!
//! DESIGN
//! ======
//! `Storefront` owns one storage backend, one session store, one API client
//! and the auth service built over them. The session store is the client's
//! token provider, so a 401 seen by any API call clears the same session the
//! auth service reads. The cart and wishlist share the storage backend.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::sync::Arc;

use crate::api::{AdminApi, StoreApi};
use crate::auth::{AuthError, AuthService};
use crate::cart::{Cart, Wishlist};
use crate::config::{ClientConfig, ConfigError};
use crate::error::ErrorCode;
use crate::guard::AuthState;
use crate::http::{ApiClient, ApiError, Transport};
use crate::session::SessionStore;
use crate::storage::{FileStorage, SessionStorage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ErrorCode for StorefrontError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Api(e) => e.error_code(),
            Self::Auth(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.retryable(),
            Self::Auth(e) => e.retryable(),
            Self::Config(_) | Self::Storage(_) => false,
        }
    }
}

pub struct Storefront {
    config: ClientConfig,
    sessions: Arc<SessionStore>,
    api: Arc<ApiClient>,
    auth: AuthService,
    cart: Cart,
    wishlist: Wishlist,
}

impl Storefront {
    /// Open against the file storage at `config.storage_path` and a real
    /// HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file is unreadable or the HTTP client
    /// cannot be built.
    pub fn open(config: ClientConfig) -> Result<Self, StorefrontError> {
        config.retry.validate()?;
        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::open(&config.storage_path)?);
        let sessions = Arc::new(SessionStore::new(Arc::clone(&storage), config.token_keys.clone()));
        let api = Arc::new(ApiClient::from_config(&config, sessions.clone())?);
        tracing::debug!(base_url = %config.base_url, storage = %config.storage_path.display(), "storefront opened");
        Ok(Self::assemble(config, storage, sessions, api))
    }

    /// Build over explicit storage and transport.
    #[must_use]
    pub fn with_parts(config: ClientConfig, storage: Arc<dyn SessionStorage>, transport: Arc<dyn Transport>) -> Self {
        let sessions = Arc::new(SessionStore::new(Arc::clone(&storage), config.token_keys.clone()));
        let api = Arc::new(ApiClient::new(&config, transport, sessions.clone()));
        Self::assemble(config, storage, sessions, api)
    }

    fn assemble(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
        sessions: Arc<SessionStore>,
        api: Arc<ApiClient>,
    ) -> Self {
        let auth = AuthService::new(Arc::clone(&api), Arc::clone(&sessions), config.fallback.clone(), config.timeouts);
        Self {
            cart: Cart::load(Arc::clone(&storage)),
            wishlist: Wishlist::load(storage),
            config,
            sessions,
            api,
            auth,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    #[must_use]
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    #[must_use]
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    #[must_use]
    pub fn store(&self) -> StoreApi {
        StoreApi::new(Arc::clone(&self.api))
    }

    #[must_use]
    pub fn admin(&self) -> AdminApi {
        AdminApi::new(Arc::clone(&self.api))
    }

    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        AuthState::from_store(&self.sessions)
    }
}
