//! Local pseudo-authentication used when the backend cannot be reached.
//!
//! STATE MACHINE
//! =============
//! `Unchecked -> RealAuth | FallbackAuth`, driven by reachability
//! observations (health probe results, network errors during login). Only in
//! `FallbackAuth`, and only when enabled by config, is the single configured
//! credential pair accepted.
//!
//! TOKENS
//! ======
//! A fallback token has three base64url segments: a header, claims (subject,
//! email, issue/expiry, random nonce, `fallback: true`) and the SHA-256 of the
//! first two. It is token-shaped so persisted state restores cleanly, but it
//! carries no signature and is never sent to the backend.

#[cfg(test)]
#[path = "fallback_test.rs"]
mod fallback_test;

use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};
use time::format_description::well_known::Rfc3339;

use super::AuthError;
use crate::config::FallbackConfig;
use crate::session::{Session, User};

pub const DEFAULT_FALLBACK_EMAIL: &str = "admin@storefront.local";
pub const DEFAULT_FALLBACK_PASSWORD: &str = "storefront123";
pub const DEFAULT_FALLBACK_NAME: &str = "Storefront Admin";
pub const FALLBACK_USER_ID: &str = "admin-fallback-001";
pub const FALLBACK_SESSION_HOURS: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthMode {
    Unchecked,
    RealAuth,
    FallbackAuth,
}

pub struct FallbackAuthenticator {
    config: FallbackConfig,
    mode: Mutex<AuthMode>,
}

impl FallbackAuthenticator {
    #[must_use]
    pub fn new(config: FallbackConfig) -> Self {
        Self { config, mode: Mutex::new(AuthMode::Unchecked) }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    #[must_use]
    pub fn mode(&self) -> AuthMode {
        *self.mode.lock()
    }

    /// Record a reachability observation and return the resulting mode.
    pub fn observe_reachability(&self, reachable: bool) -> AuthMode {
        let next = if reachable { AuthMode::RealAuth } else { AuthMode::FallbackAuth };
        let mut mode = self.mode.lock();
        if *mode != next {
            tracing::info!(from = ?*mode, to = ?next, "auth mode changed");
        }
        *mode = next;
        next
    }

    /// Exact comparison against the configured pair.
    #[must_use]
    pub fn matches(&self, email: &str, password: &str) -> bool {
        email == self.config.email && password == self.config.password
    }

    /// Mint a fallback session for `email`/`password`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::FallbackDisabled`] when fallback is off in config.
    /// - [`AuthError::BackendReachable`] unless the machine is in `FallbackAuth`.
    /// - [`AuthError::InvalidCredentials`] when the pair does not match.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if !self.config.enabled {
            return Err(AuthError::FallbackDisabled);
        }
        if self.mode() != AuthMode::FallbackAuth {
            return Err(AuthError::BackendReachable);
        }
        if !self.matches(email, password) {
            tracing::warn!("fallback login rejected: credentials do not match");
            return Err(AuthError::InvalidCredentials("Invalid credentials (fallback mode)".into()));
        }

        let now = OffsetDateTime::now_utc();
        let expires_at = now + Duration::hours(FALLBACK_SESSION_HOURS);
        let user = fallback_user(&self.config, now);
        let token = mint_fallback_token(&user, now, expires_at);
        tracing::warn!(user_id = %user.id, "fallback admin session created; backend was unreachable");
        Ok(Session::fallback(token, user, Some(expires_at)))
    }
}

/// The synthesized admin user for the configured pair.
#[must_use]
pub fn fallback_user(config: &FallbackConfig, created_at: OffsetDateTime) -> User {
    User {
        id: FALLBACK_USER_ID.to_owned(),
        name: config.name.clone(),
        email: config.email.clone(),
        is_admin: true,
        role: Some("admin".to_owned()),
        created_at: created_at.format(&Rfc3339).ok(),
        phone: None,
        address: None,
    }
}

fn mint_fallback_token(user: &User, issued_at: OffsetDateTime, expires_at: OffsetDateTime) -> String {
    let nonce: [u8; 16] = rand::rng().random();
    let header = serde_json::json!({ "alg": "none", "typ": "JWT", "kind": "fallback" });
    let claims = serde_json::json!({
        "sub": user.id,
        "email": user.email,
        "iat": issued_at.unix_timestamp(),
        "exp": expires_at.unix_timestamp(),
        "nonce": bytes_to_hex(&nonce),
        "fallback": true,
    });

    let head = URL_SAFE_NO_PAD.encode(header.to_string());
    let body = URL_SAFE_NO_PAD.encode(claims.to_string());
    let digest = Sha256::digest(format!("{head}.{body}").as_bytes());
    format!("{head}.{body}.{}", URL_SAFE_NO_PAD.encode(digest))
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}
