//! Client configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! One configuration surface for everything the request layer needs: base
//! URL, timeouts, retry policy, token storage keys, storage location and the
//! fallback credential pair. Parsing goes through a lookup function so the
//! same code serves `std::env` and tests without touching process state.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};

use crate::auth::fallback::{DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_NAME, DEFAULT_FALLBACK_PASSWORD};
use crate::error::ErrorCode;
use crate::token::DEFAULT_TOKEN_KEYS;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_HEALTH_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_AUTH_CHECK_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_RETRY_BASE_MS: u64 = 500;
pub const DEFAULT_RETRY_FACTOR: f32 = 2.0;
pub const DEFAULT_RETRY_MAX_DELAY_SECS: u64 = 30;
pub const DEFAULT_STORAGE_PATH: &str = ".storefront/storage.json";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("invalid retry policy: {0}")]
    InvalidRetryPolicy(String),
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidValue { .. } => "E_CONFIG_VALUE",
            Self::InvalidRetryPolicy(_) => "E_CONFIG_RETRY_POLICY",
        }
    }
}

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Exponential backoff applied to transient transport failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: usize,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to each subsequent delay.
    pub factor: f32,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_RETRY_BASE_MS),
            factor: DEFAULT_RETRY_FACTOR,
            max_delay: Duration::from_secs(DEFAULT_RETRY_MAX_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Backoff builder for `backon`. Jitter stays off so delays are monotonic.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_factor(self.factor)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
    }

    /// The full delay schedule, one entry per retry.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.backoff().build().collect()
    }

    /// Reject policies whose delays would not strictly increase.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRetryPolicy`] when the factor is not
    /// greater than one, the initial delay is zero, or the last delay would be
    /// clamped by `max_delay`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.factor > 1.0) {
            return Err(ConfigError::InvalidRetryPolicy(format!("factor must be > 1, got {}", self.factor)));
        }
        if self.initial_delay.is_zero() {
            return Err(ConfigError::InvalidRetryPolicy("initial delay must be non-zero".into()));
        }
        if self.max_retries == 0 {
            return Ok(());
        }
        let exponent = i32::try_from(self.max_retries - 1).unwrap_or(i32::MAX);
        let last = Duration::try_from_secs_f32(self.initial_delay.as_secs_f32() * self.factor.powi(exponent))
            .map_err(|_| ConfigError::InvalidRetryPolicy("delay schedule overflows".into()))?;
        if last > self.max_delay {
            return Err(ConfigError::InvalidRetryPolicy(format!(
                "last delay {last:?} exceeds max delay {:?}",
                self.max_delay
            )));
        }
        Ok(())
    }
}

// =============================================================================
// TIMEOUTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Duration,
    pub connect: Duration,
    pub health: Duration,
    pub auth_check: Duration,
    pub login: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            connect: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            health: Duration::from_secs(DEFAULT_HEALTH_TIMEOUT_SECS),
            auth_check: Duration::from_secs(DEFAULT_AUTH_CHECK_TIMEOUT_SECS),
            login: Duration::from_secs(DEFAULT_LOGIN_TIMEOUT_SECS),
        }
    }
}

// =============================================================================
// FALLBACK
// =============================================================================

/// Local credential pair accepted when the backend cannot be reached.
#[derive(Clone, PartialEq, Eq)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            email: DEFAULT_FALLBACK_EMAIL.to_owned(),
            password: DEFAULT_FALLBACK_PASSWORD.to_owned(),
            name: DEFAULT_FALLBACK_NAME.to_owned(),
        }
    }
}

impl fmt::Debug for FallbackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackConfig")
            .field("enabled", &self.enabled)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

// =============================================================================
// CLIENT CONFIG
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
    pub token_keys: Vec<String>,
    pub storage_path: PathBuf,
    pub fallback: FallbackConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Config with defaults for everything except the base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            timeouts: Timeouts::default(),
            retry: RetryPolicy::default(),
            token_keys: DEFAULT_TOKEN_KEYS.iter().map(|k| (*k).to_owned()).collect(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            fallback: FallbackConfig::default(),
        }
    }

    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `STOREFRONT_API_URL`: default `http://127.0.0.1:5000/api`
    /// - `STOREFRONT_REQUEST_TIMEOUT_SECS`: default 15
    /// - `STOREFRONT_MAX_RETRIES`: default 3
    /// - `STOREFRONT_RETRY_BASE_MS`: default 500
    /// - `STOREFRONT_STORAGE_PATH`: default `.storefront/storage.json`
    /// - `STOREFRONT_FALLBACK_AUTH`: enable local fallback login (default off)
    /// - `STOREFRONT_FALLBACK_EMAIL` / `STOREFRONT_FALLBACK_PASSWORD`
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is set but cannot be parsed, or when
    /// the resulting retry policy is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("STOREFRONT_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let mut config = Self::new(base_url);

        config.timeouts.request = Duration::from_secs(parse_u64(
            &lookup,
            "STOREFRONT_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?);
        config.retry.max_retries = usize::try_from(parse_u64(
            &lookup,
            "STOREFRONT_MAX_RETRIES",
            DEFAULT_MAX_RETRIES as u64,
        )?)
        .map_err(|_| ConfigError::InvalidValue { var: "STOREFRONT_MAX_RETRIES", value: "out of range".into() })?;
        config.retry.initial_delay =
            Duration::from_millis(parse_u64(&lookup, "STOREFRONT_RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS)?);
        config.retry.validate()?;

        if let Some(path) = lookup("STOREFRONT_STORAGE_PATH").filter(|p| !p.trim().is_empty()) {
            config.storage_path = PathBuf::from(path);
        }

        config.fallback.enabled = parse_bool(&lookup, "STOREFRONT_FALLBACK_AUTH")?.unwrap_or(false);
        if let Some(email) = lookup("STOREFRONT_FALLBACK_EMAIL") {
            config.fallback.email = email;
        }
        if let Some(password) = lookup("STOREFRONT_FALLBACK_PASSWORD") {
            config.fallback.password = password;
        }

        Ok(config)
    }
}

/// Trim whitespace and trailing slashes so endpoints can be appended verbatim.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn parse_u64<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}

fn parse_bool<F>(lookup: &F, var: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue { var, value: raw }),
    }
}
