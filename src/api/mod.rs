//! Typed operations over the storefront REST endpoints.

pub mod admin;
pub mod endpoints;
pub mod store;
pub mod types;

pub use admin::AdminApi;
pub use store::{ProductQuery, StoreApi};

use crate::http::ApiError;

fn to_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::InvalidRequest(e.to_string()))
}
