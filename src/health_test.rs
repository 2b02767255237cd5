use super::*;
use crate::session::Session;
use crate::test_support::{MockTransport, fast_config, json_response, sample_user, wired_client};
use crate::http::TransportError;
use serde_json::json;

#[tokio::test]
async fn healthy_backend_is_reachable() {
    let transport = MockTransport::scripted(vec![json_response(200, json!({ "status": "ok", "db": "up" }))]);
    let (api, _) = wired_client(&fast_config(3), transport.clone());

    let report = probe(&api, Duration::from_secs(2)).await;

    assert!(report.reachable);
    assert_eq!(report.status, Some(200));
    assert_eq!(report.detail, Some(json!({ "status": "ok", "db": "up" })));
    assert_eq!(transport.paths(), vec!["/health".to_owned()]);
    assert_eq!(transport.last().timeout, Duration::from_secs(2));
}

#[tokio::test]
async fn timeout_is_unreachable_after_one_attempt() {
    let transport = MockTransport::scripted(vec![Err(TransportError::Timeout)]);
    let (api, _) = wired_client(&fast_config(3), transport.clone());

    assert!(!check_api_health(&api, Duration::from_millis(50)).await);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn server_error_reports_status() {
    let transport = MockTransport::scripted(vec![json_response(503, json!({ "message": "db down" }))]);
    let (api, _) = wired_client(&fast_config(0), transport);

    let report = probe(&api, Duration::from_secs(1)).await;

    assert!(!report.reachable);
    assert_eq!(report.status, Some(503));
    assert_eq!(report.error.as_deref(), Some("db down"));
}

#[tokio::test]
async fn health_check_never_sends_credentials() {
    let transport = MockTransport::scripted(vec![json_response(200, json!({}))]);
    let (api, sessions) = wired_client(&fast_config(0), transport.clone());
    sessions.establish(Session::backend("a.b.c", sample_user("u1", false))).unwrap();

    assert!(check_api_health(&api, Duration::from_secs(1)).await);
    assert_eq!(transport.last().header("Authorization"), None);
    assert!(sessions.is_authenticated());
}
