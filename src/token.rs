//! Bearer-token resolution over persisted storage.
//!
//! SYSTEM CONTEXT
//! ==============
//! Different login paths have historically written the credential under
//! different keys. The resolver scans them in a fixed order and accepts the
//! first value shaped like a three-segment token, so the request layer has a
//! single place to ask "what do I send as `Authorization`?".

#[cfg(test)]
#[path = "token_test.rs"]
mod token_test;

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use parking_lot::Mutex;
use time::OffsetDateTime;

use crate::storage::SessionStorage;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Storage keys scanned by [`TokenResolver`], in priority order.
pub const DEFAULT_TOKEN_KEYS: [&str; 3] = ["token", "authToken", "adminToken"];

/// Source of the `Authorization` header for outgoing requests.
pub trait TokenProvider: Send + Sync {
    /// Header value including the `Bearer ` prefix, if a credential exists.
    fn bearer_token(&self) -> Option<String>;

    /// Forget every credential this provider can yield. Called on HTTP 401.
    fn invalidate(&self);
}

// =============================================================================
// SHAPE
// =============================================================================

/// Strip quoting and an optional `Bearer ` prefix from a stored value.
#[must_use]
pub fn strip_token(raw: &str) -> &str {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .trim();
    match unquoted.get(..BEARER_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(BEARER_PREFIX) => unquoted[BEARER_PREFIX.len()..].trim(),
        _ => unquoted,
    }
}

/// `true` when `token` is three non-empty base64url segments joined by dots.
#[must_use]
pub fn is_token_shape(token: &str) -> bool {
    let mut segments = 0_usize;
    for segment in token.split('.') {
        segments += 1;
        if segment.is_empty() || !segment.bytes().all(is_base64url_byte) {
            return false;
        }
    }
    segments == 3
}

fn is_base64url_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Validate a stored value and return it as an `Authorization` header value.
#[must_use]
pub fn normalize_bearer(raw: &str) -> Option<String> {
    let token = strip_token(raw);
    is_token_shape(token).then(|| format!("{BEARER_PREFIX}{token}"))
}

/// Decode the middle (claims) segment of a token, if it is JSON.
#[must_use]
pub fn decode_claims(token: &str) -> Option<serde_json::Value> {
    let token = strip_token(token);
    if !is_token_shape(token) {
        return None;
    }
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// The `exp` claim as a timestamp, when present.
#[must_use]
pub fn token_expiry(token: &str) -> Option<OffsetDateTime> {
    let exp = decode_claims(token)?.get("exp")?.as_i64()?;
    OffsetDateTime::from_unix_timestamp(exp).ok()
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Scans storage keys in order for the first well-formed token.
pub struct TokenResolver {
    storage: Arc<dyn SessionStorage>,
    keys: Vec<String>,
}

impl TokenResolver {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>, keys: Vec<String>) -> Self {
        Self { storage, keys }
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The first valid token and the key it was found under.
    #[must_use]
    pub fn resolve_entry(&self) -> Option<(&str, String)> {
        self.resolve_where(|_| true)
    }

    /// Like [`TokenResolver::resolve_entry`], skipping tokens `accept` rejects.
    pub fn resolve_where<F>(&self, accept: F) -> Option<(&str, String)>
    where
        F: Fn(&str) -> bool,
    {
        self.keys.iter().find_map(|key| {
            let raw = self.storage.get(key)?;
            let token = strip_token(&raw);
            if !is_token_shape(token) {
                tracing::debug!(key = key.as_str(), "ignoring malformed stored token");
                return None;
            }
            if !accept(token) {
                tracing::debug!(key = key.as_str(), "skipping rejected stored token");
                return None;
            }
            Some((key.as_str(), token.to_owned()))
        })
    }

    /// Bearer-prefixed token, or `None` when no key holds a valid token.
    #[must_use]
    pub fn resolve(&self) -> Option<String> {
        self.resolve_entry()
            .map(|(_, token)| format!("{BEARER_PREFIX}{token}"))
    }
}

impl TokenProvider for TokenResolver {
    fn bearer_token(&self) -> Option<String> {
        self.resolve()
    }

    fn invalidate(&self) {
        for key in &self.keys {
            if let Err(error) = self.storage.remove(key) {
                tracing::warn!(key = key.as_str(), %error, "failed to remove stored token");
            }
        }
    }
}

// =============================================================================
// STATIC
// =============================================================================

/// A token supplied directly (e.g. on the command line), never persisted.
#[derive(Debug, Default)]
pub struct StaticToken {
    token: Mutex<Option<String>>,
}

impl StaticToken {
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self { token: Mutex::new(normalize_bearer(raw)) }
    }
}

impl TokenProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.token.lock().clone()
    }

    fn invalidate(&self) {
        self.token.lock().take();
    }
}
