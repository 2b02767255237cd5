use super::*;

#[test]
fn transient_classification() {
    assert!(TransportError::Timeout.is_transient());
    assert!(TransportError::Network("connection refused".into()).is_transient());
    assert!(!TransportError::Build("bad url".into()).is_transient());
}

#[test]
fn status_message_prefers_message_field() {
    let body = br#"{"message":"Product not found","error":"NotFound"}"#;
    assert_eq!(status_message(404, body), "Product not found");
}

#[test]
fn status_message_falls_back_to_error_field() {
    assert_eq!(status_message(400, br#"{"error":"bad input"}"#), "bad input");
}

#[test]
fn status_message_defaults_to_status_line() {
    assert_eq!(status_message(502, b"<html>Bad Gateway</html>"), "HTTP 502");
    assert_eq!(status_message(500, br#"{"message":"  "}"#), "HTTP 500");
    assert_eq!(status_message(503, b""), "HTTP 503");
}

#[test]
fn error_status_and_codes() {
    let unauthorized = ApiError::Unauthorized { message: "expired".into() };
    assert_eq!(unauthorized.status(), Some(401));
    assert_eq!(unauthorized.error_code(), "E_UNAUTHORIZED");

    let status = ApiError::Status { status: 404, message: "missing".into() };
    assert_eq!(status.status(), Some(404));
    assert_eq!(status.to_string(), "missing");

    let unreachable = ApiError::Unreachable { attempts: 4, message: "request timed out".into() };
    assert_eq!(unreachable.status(), None);
    assert!(unreachable.is_unreachable());
    assert_eq!(unreachable.to_string(), "request failed after 4 attempts: request timed out");
}

#[test]
fn retryable_only_for_unreachable_and_server_side_statuses() {
    assert!(ApiError::Unreachable { attempts: 4, message: "timed out".into() }.retryable());
    assert!(ApiError::Status { status: 503, message: "down".into() }.retryable());
    assert!(ApiError::Status { status: 429, message: "slow down".into() }.retryable());
    assert!(!ApiError::Status { status: 404, message: "missing".into() }.retryable());
    assert!(!ApiError::Unauthorized { message: "expired".into() }.retryable());
    assert!(!ApiError::Decode("bad json".into()).retryable());
}
