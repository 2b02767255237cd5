//! Backend reachability probe.

#[cfg(test)]
#[path = "health_test.rs"]
mod health_test;

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::api::endpoints::HEALTH;
use crate::http::{ApiClient, ApiError, RequestOptions};

/// Outcome of a single `/health` probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub reachable: bool,
    pub latency_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `true` when `GET /health` answers 2xx within `timeout`. One attempt, no auth.
pub async fn check_api_health(api: &ApiClient, timeout: Duration) -> bool {
    probe(api, timeout).await.reachable
}

/// Probe `/health` and report latency plus the backend's own payload.
pub async fn probe(api: &ApiClient, timeout: Duration) -> HealthReport {
    let started = Instant::now();
    let options = RequestOptions::get().anonymous().no_retry().with_timeout(timeout);
    let result = api.request::<serde_json::Value>(HEALTH, options).await;
    let latency_ms = started.elapsed().as_millis();

    match result {
        Ok(detail) => HealthReport { reachable: true, latency_ms, status: Some(200), detail: Some(detail), error: None },
        Err(error) => {
            tracing::warn!(%error, "API health check failed");
            HealthReport {
                reachable: false,
                latency_ms,
                status: error.status(),
                detail: None,
                error: Some(describe(&error)),
            }
        }
    }
}

fn describe(error: &ApiError) -> String {
    match error {
        ApiError::Unreachable { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
