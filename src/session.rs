//! Auth session store: the current user and token, in memory and persisted.
//!
//! SYSTEM CONTEXT
//! ==============
//! Login, register and fallback login all end in [`SessionStore::establish`];
//! logout and any HTTP 401 end in [`SessionStore::clear`]. The store doubles
//! as the `TokenProvider` for the request layer.
//!
//! INVARIANTS
//! ==========
//! - At most one session is active per store.
//! - A fallback session is never presented to the backend: `bearer_token`
//!   yields nothing while one is active, and the storage scan skips any
//!   token recorded as or claiming to be a fallback token.
//! - `token` is written last, so a failed write never pairs a new token
//!   with another user's snapshot.
//! - Expired sessions read as absent and are cleared on first access.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::storage::{SessionStorage, StorageError, load_json, save_json};
use crate::token::{
    TokenProvider, TokenResolver, decode_claims, is_token_shape, normalize_bearer, strip_token, token_expiry,
};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const EXPIRES_KEY: &str = "expiresAt";
pub const FALLBACK_TOKEN_KEY: &str = "storefront_admin_session";
pub const FALLBACK_USER_KEY: &str = "storefront_admin_user";

/// A user as returned by `/auth/login`, `/auth/me` and `/admin/users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier; MongoDB-style `_id` is accepted on input.
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user: User,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub is_fallback: bool,
}

impl Session {
    /// Session issued by the backend. Expiry comes from the token's `exp` claim.
    #[must_use]
    pub fn backend(token: &str, user: User) -> Self {
        let token = strip_token(token).to_owned();
        let expires_at = token_expiry(&token);
        Self { token, user, expires_at, is_fallback: false }
    }

    /// Locally synthesized session; see `auth::fallback`.
    #[must_use]
    pub fn fallback(token: String, user: User, expires_at: Option<OffsetDateTime>) -> Self {
        Self { token, user, expires_at, is_fallback: true }
    }

    /// Only backend-issued sessions count as verified.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        !self.is_fallback
    }

    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    resolver: TokenResolver,
    current: RwLock<Option<Session>>,
}

impl SessionStore {
    /// Open a store over `storage`, restoring any persisted session.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>, token_keys: Vec<String>) -> Self {
        let restored = restore(storage.as_ref());
        if let Some(session) = &restored {
            tracing::debug!(user_id = %session.user.id, fallback = session.is_fallback, "restored persisted session");
        }
        Self {
            resolver: TokenResolver::new(Arc::clone(&storage), token_keys),
            storage,
            current: RwLock::new(restored),
        }
    }

    #[must_use]
    pub fn storage(&self) -> Arc<dyn SessionStorage> {
        Arc::clone(&self.storage)
    }

    /// Replace the active session and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written to storage; the
    /// in-memory session is left unchanged in that case.
    pub fn establish(&self, session: Session) -> Result<(), StorageError> {
        let storage = self.storage.as_ref();
        save_json(storage, USER_KEY, &session.user)?;
        if let Err(error) = persist_token(storage, &session) {
            if let Err(cleanup) = storage.remove(TOKEN_KEY) {
                tracing::warn!(%cleanup, "failed to drop token after partial session write");
            }
            return Err(error);
        }

        tracing::info!(user_id = %session.user.id, admin = session.user.is_admin, fallback = session.is_fallback, "session established");
        *self.current.write() = Some(session);
        Ok(())
    }

    /// Replace the user snapshot of the active session (after `/auth/me`).
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be written to storage.
    pub fn update_user(&self, user: User) -> Result<(), StorageError> {
        let mut current = self.current.write();
        let Some(session) = current.as_mut() else {
            return Ok(());
        };
        save_json(self.storage.as_ref(), USER_KEY, &user)?;
        session.user = user;
        Ok(())
    }

    /// Drop the active session and every persisted credential key.
    pub fn clear(&self) {
        self.current.write().take();
        let extra = [USER_KEY, EXPIRES_KEY, FALLBACK_TOKEN_KEY, FALLBACK_USER_KEY];
        let keys = self
            .resolver
            .keys()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(TOKEN_KEY))
            .chain(extra);
        for key in keys {
            if let Err(error) = self.storage.remove(key) {
                tracing::warn!(key, %error, "failed to remove session key");
            }
        }
        tracing::info!("session cleared");
    }

    /// The active, unexpired session.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        let session = self.current.read().clone()?;
        if session.is_expired_at(OffsetDateTime::now_utc()) {
            tracing::info!(user_id = %session.user.id, "session expired");
            self.clear();
            return None;
        }
        Some(session)
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.current().map(|session| session.user)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.current().is_some_and(|session| session.user.is_admin)
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.current().is_some_and(|session| session.is_fallback)
    }
}

impl TokenProvider for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        match self.current() {
            Some(session) if session.is_fallback => None,
            Some(session) => normalize_bearer(&session.token),
            None => {
                let storage = self.storage.as_ref();
                let (_, token) = self.resolver.resolve_where(|token| !is_fallback_token(storage, token))?;
                normalize_bearer(&token)
            }
        }
    }

    fn invalidate(&self) {
        self.clear();
    }
}

/// Token last, so a failed write never leaves a new token beside stale keys.
fn persist_token(storage: &dyn SessionStorage, session: &Session) -> Result<(), StorageError> {
    match session.expires_at.and_then(|at| at.format(&Rfc3339).ok()) {
        Some(expires_at) => storage.set(EXPIRES_KEY, &expires_at)?,
        None => storage.remove(EXPIRES_KEY)?,
    }
    if session.is_fallback {
        storage.set(FALLBACK_TOKEN_KEY, &session.token)?;
        save_json(storage, FALLBACK_USER_KEY, &session.user)?;
    } else {
        storage.remove(FALLBACK_TOKEN_KEY)?;
        storage.remove(FALLBACK_USER_KEY)?;
    }
    storage.set(TOKEN_KEY, &session.token)
}

/// A token minted locally: either recorded under the fallback key or
/// carrying the `fallback` claim.
fn is_fallback_token(storage: &dyn SessionStorage, token: &str) -> bool {
    let token = strip_token(token);
    let recorded = storage
        .get(FALLBACK_TOKEN_KEY)
        .is_some_and(|stored| strip_token(&stored) == token);
    recorded
        || decode_claims(token)
            .and_then(|claims| claims.get("fallback")?.as_bool())
            .unwrap_or(false)
}

fn restore(storage: &dyn SessionStorage) -> Option<Session> {
    let raw = storage.get(TOKEN_KEY)?;
    let token = strip_token(&raw);
    if !is_token_shape(token) {
        tracing::debug!("stored token is malformed, ignoring");
        return None;
    }
    let is_fallback = is_fallback_token(storage, token);
    let user: User = load_json(storage, USER_KEY)
        .or_else(|| is_fallback.then(|| load_json(storage, FALLBACK_USER_KEY)).flatten())?;
    let expires_at = storage
        .get(EXPIRES_KEY)
        .and_then(|raw| OffsetDateTime::parse(&raw, &Rfc3339).ok())
        .or_else(|| token_expiry(token));
    Some(Session { token: token.to_owned(), user, expires_at, is_fallback })
}
