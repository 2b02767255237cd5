//! Auth service: every operation that creates, refreshes or ends a session.
//!
//! SYSTEM CONTEXT
//! ==============
//! Sits between callers (CLI, guards) and the request layer. Successful
//! logins end in `SessionStore::establish`; logout and failed auth checks end
//! in `SessionStore::clear`. Admin login additionally drives the fallback
//! state machine from the health probe and from network failures.
//!
//! ERROR HANDLING
//! ==============
//! Backend rejections surface as `AuthError::Api` with the backend's message.
//! Only an unreachable backend can lead to a fallback session; a reachable
//! backend that says no is final.

#[cfg(test)]
#[path = "service_test.rs"]
mod service_test;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::AuthError;
use super::fallback::{AuthMode, FallbackAuthenticator};
use crate::api::endpoints;
use crate::config::{FallbackConfig, Timeouts};
use crate::health::check_api_health;
use crate::http::{ApiClient, RequestOptions};
use crate::session::{Session, SessionStore, User};
use crate::token::{TokenProvider, is_token_shape, strip_token};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Result of [`AuthService::admin_login`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogin {
    pub user: User,
    pub fallback: bool,
}

/// `/auth/me` answers either with the user itself or wrapped in `{ user }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl MeResponse {
    fn into_user(self) -> User {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

pub struct AuthService {
    api: Arc<ApiClient>,
    sessions: Arc<SessionStore>,
    fallback: FallbackAuthenticator,
    timeouts: Timeouts,
}

impl AuthService {
    #[must_use]
    pub fn new(api: Arc<ApiClient>, sessions: Arc<SessionStore>, fallback: FallbackConfig, timeouts: Timeouts) -> Self {
        Self { api, sessions, fallback: FallbackAuthenticator::new(fallback), timeouts }
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    #[must_use]
    pub fn fallback(&self) -> &FallbackAuthenticator {
        &self.fallback
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.sessions.user()
    }

    /// Log in against `/auth/login`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Validation`] for empty input.
    /// - [`AuthError::InvalidResponse`] when the backend omits token or user.
    /// - [`AuthError::AccessDenied`] when `admin` is set and the user is not one.
    /// - [`AuthError::Api`] for backend or transport failures.
    pub async fn login(&self, email: &str, password: &str, admin: bool) -> Result<User, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Please provide email and password".into()));
        }

        tracing::info!(%email, admin, "login attempt");
        let body = json!({ "email": email, "password": password, "isAdmin": admin });
        let options = RequestOptions::post(body).with_timeout(self.timeouts.login);
        let response: Value = match self.api.request(endpoints::LOGIN, options).await {
            Ok(response) => response,
            Err(error) => {
                if error.is_unreachable() {
                    self.fallback.observe_reachability(false);
                }
                tracing::warn!(%error, %email, "login failed");
                return Err(error.into());
            }
        };
        self.fallback.observe_reachability(true);

        let (token, user) = session_parts(&response)?;
        if admin && !user.is_admin {
            tracing::warn!(user_id = %user.id, "admin login by non-admin user");
            return Err(AuthError::AccessDenied);
        }
        self.sessions.establish(Session::backend(&token, user.clone()))?;
        tracing::info!(user_id = %user.id, admin = user.is_admin, "login succeeded");
        Ok(user)
    }

    /// Create an account via `/auth/register` and log it in.
    ///
    /// # Errors
    ///
    /// Validation failures are reported before any request is made; see
    /// [`AuthService::login`] for the rest.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("Please provide all required fields".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation("Password must be at least 6 characters long".into()));
        }

        let body = json!({ "name": name, "email": email, "password": password });
        let response: Value = self.api.request(endpoints::REGISTER, RequestOptions::post(body)).await?;
        let (token, user) = session_parts(&response)?;
        self.sessions.establish(Session::backend(&token, user.clone()))?;
        tracing::info!(user_id = %user.id, "registration succeeded");
        Ok(user)
    }

    pub fn logout(&self) {
        self.sessions.clear();
    }

    /// Revalidate the stored credentials against `/auth/me`.
    ///
    /// Returns `None` without a network call when nothing is stored. Fallback
    /// sessions are returned as-is. Any failure clears the session.
    pub async fn check_auth(&self) -> Option<User> {
        let current = self.sessions.current();
        if let Some(session) = current.as_ref().filter(|s| s.is_fallback) {
            return Some(session.user.clone());
        }
        let bearer = self.sessions.bearer_token()?;

        let options = RequestOptions::get().no_retry().with_timeout(self.timeouts.auth_check);
        let user = match self.api.request::<MeResponse>(endpoints::ME, options).await {
            Ok(response) => response.into_user(),
            Err(error) => {
                tracing::warn!(%error, "auth check failed, clearing session");
                self.sessions.clear();
                return None;
            }
        };

        let stored = match current {
            Some(_) => self.sessions.update_user(user.clone()),
            None => self.sessions.establish(Session::backend(&bearer, user.clone())),
        };
        if let Err(error) = stored {
            tracing::warn!(%error, "failed to persist refreshed user");
        }
        Some(user)
    }

    /// Install a session obtained elsewhere (e.g. an OAuth redirect).
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for a malformed token, or a storage error.
    pub fn set_auth_token(&self, token: &str, user: User) -> Result<(), AuthError> {
        if !is_token_shape(strip_token(token)) {
            return Err(AuthError::Validation("Invalid token".into()));
        }
        self.sessions.establish(Session::backend(token, user))?;
        Ok(())
    }

    /// Admin login with local fallback when the backend cannot be reached.
    ///
    /// # Errors
    ///
    /// Backend rejections and non-admin users fail without trying the
    /// fallback. In fallback mode, a credential mismatch fails with
    /// [`AuthError::InvalidCredentials`].
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AdminLogin, AuthError> {
        let reachable = check_api_health(&self.api, self.timeouts.health).await;
        let mode = self.fallback.observe_reachability(reachable);

        if mode == AuthMode::FallbackAuth && self.fallback.is_enabled() {
            tracing::warn!("backend unreachable, using fallback authentication");
            return self.fallback_login(email, password);
        }

        match self.login(email, password, true).await {
            Ok(user) => Ok(AdminLogin { user, fallback: false }),
            Err(AuthError::Api(error)) if error.is_unreachable() && self.fallback.is_enabled() => {
                tracing::warn!(%error, "network error during admin login, trying fallback");
                self.fallback_login(email, password)
            }
            Err(error) => Err(error),
        }
    }

    fn fallback_login(&self, email: &str, password: &str) -> Result<AdminLogin, AuthError> {
        let session = self.fallback.authenticate(email, password)?;
        let user = session.user.clone();
        self.sessions.establish(session)?;
        Ok(AdminLogin { user, fallback: true })
    }
}

/// Trim and lower-case, as the backend stores emails.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Extract `token` and `user` from a login/register response.
fn session_parts(response: &Value) -> Result<(String, User), AuthError> {
    let token = response
        .get("token")
        .and_then(Value::as_str)
        .map(strip_token)
        .filter(|token| is_token_shape(token))
        .ok_or(AuthError::InvalidResponse)?
        .to_owned();
    let user = response
        .get("user")
        .filter(|user| user.is_object())
        .and_then(|user| serde_json::from_value::<User>(user.clone()).ok())
        .ok_or(AuthError::InvalidResponse)?;
    Ok((token, user))
}
