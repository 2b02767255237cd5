//! Client library for a REST e-commerce storefront and its admin dashboard.
//!
//! ARCHITECTURE
//! ============
//! Leaves first:
//!
//! - `config`: typed configuration from the environment.
//! - `storage`: key/value session storage (memory or JSON file).
//! - `token`: multi-key bearer token resolution and token-shape checks.
//! - `http`: JSON requests over an injected transport, with timeouts,
//!   exponential-backoff retry and 401 handling.
//! - `session`: the single active user session, persisted.
//! - `health`: backend reachability probe.
//! - `auth`: login, registration, admin login and the local fallback used
//!   when the backend cannot be reached.
//! - `api`: typed storefront and admin endpoints.
//! - `cart`, `guard`: locally persisted shopping state and route access.
//! - `state`: [`Storefront`], which wires all of the above together.

pub mod api;
pub mod auth;
pub mod cart;
pub mod config;
pub mod error;
pub mod guard;
pub mod health;
pub mod http;
pub mod session;
pub mod state;
pub mod storage;
pub mod token;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use error::ErrorCode;
pub use session::{Session, SessionStore, User};
pub use state::{Storefront, StorefrontError};
