use super::*;
use crate::auth::fallback::{DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_PASSWORD, FALLBACK_USER_ID};
use crate::http::{ApiError, HttpRequest, HttpResponse, TransportError};
use crate::test_support::{MockTransport, fast_config, json_response, sample_user, wired_client};

const TOKEN: &str = "aGVhZGVy.Y2xhaW1z.c2ln";

fn service(transport: Arc<MockTransport>, fallback_enabled: bool) -> AuthService {
    let config = fast_config(1);
    let (api, sessions) = wired_client(&config, transport);
    let fallback = FallbackConfig { enabled: fallback_enabled, ..FallbackConfig::default() };
    AuthService::new(api, sessions, fallback, config.timeouts)
}

fn login_ok(user: &User) -> Result<HttpResponse, TransportError> {
    json_response(200, json!({ "token": TOKEN, "user": user }))
}

/// Backend that is healthy and answers login with `login`.
fn backend(login: fn(&HttpRequest) -> Result<HttpResponse, TransportError>) -> Arc<MockTransport> {
    MockTransport::new(move |request| match request.url.rsplit_once("/api").map(|(_, path)| path) {
        Some("/health") => json_response(200, json!({ "status": "ok" })),
        Some("/auth/login") => login(request),
        _ => json_response(404, json!({ "message": "not found" })),
    })
}

fn unreachable() -> Arc<MockTransport> {
    MockTransport::new(|_| Err(TransportError::Network("connection refused".into())))
}

// =============================================================================
// LOGIN
// =============================================================================

#[tokio::test]
async fn login_normalizes_email_and_establishes_session() {
    let transport = MockTransport::scripted(vec![login_ok(&sample_user("u1", false))]);
    let auth = service(transport.clone(), false);

    let user = auth.login("  Asha@Example.TEST ", "hunter22", false).await.unwrap();

    assert_eq!(user.id, "u1");
    let sent = transport.last();
    assert_eq!(sent.body, Some(json!({ "email": "asha@example.test", "password": "hunter22", "isAdmin": false })));
    assert_eq!(sent.timeout, auth.timeouts.login);
    assert!(auth.sessions().is_authenticated());
    assert_eq!(auth.sessions().bearer_token().as_deref(), Some(&*format!("Bearer {TOKEN}")));
    assert_eq!(auth.fallback().mode(), AuthMode::RealAuth);
}

#[tokio::test]
async fn login_without_token_or_user_is_invalid_response() {
    let bodies = [
        json!({ "user": sample_user("u1", false) }),
        json!({ "token": TOKEN }),
        json!({ "token": "not-a-token", "user": sample_user("u1", false) }),
        json!({ "token": TOKEN, "user": "u1" }),
    ];
    for body in bodies {
        let auth = service(MockTransport::scripted(vec![json_response(200, body.clone())]), false);
        let err = auth.login("a@b.c", "secret1", false).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidResponse), "{body}");
        assert_eq!(err.to_string(), "Invalid response from server");
        assert!(!auth.sessions().is_authenticated());
    }
}

#[tokio::test]
async fn admin_login_flag_rejects_non_admin() {
    let auth = service(MockTransport::scripted(vec![login_ok(&sample_user("u1", false))]), false);
    let err = auth.login("a@b.c", "secret1", true).await.unwrap_err();
    assert_eq!(err.to_string(), "Access denied. Admin privileges required.");
    assert!(!auth.sessions().is_authenticated());
}

#[tokio::test]
async fn backend_rejection_carries_message() {
    let transport = MockTransport::scripted(vec![json_response(400, json!({ "message": "Invalid credentials" }))]);
    let auth = service(transport, false);
    let err = auth.login("a@b.c", "wrong", false).await.unwrap_err();
    assert!(matches!(err, AuthError::Api(ApiError::Status { status: 400, .. })));
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[tokio::test]
async fn empty_credentials_fail_without_request() {
    let transport = MockTransport::scripted(vec![]);
    let auth = service(transport.clone(), false);
    assert!(matches!(auth.login("  ", "x", false).await, Err(AuthError::Validation(_))));
    assert_eq!(transport.calls(), 0);
}

// =============================================================================
// REGISTER
// =============================================================================

#[tokio::test]
async fn register_validates_before_sending() {
    let transport = MockTransport::scripted(vec![]);
    let auth = service(transport.clone(), false);

    let err = auth.register("", "a@b.c", "secret1").await.unwrap_err();
    assert_eq!(err.to_string(), "Please provide all required fields");
    let err = auth.register("Asha", "a@b.c", "12345").await.unwrap_err();
    assert_eq!(err.to_string(), "Password must be at least 6 characters long");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn register_trims_and_logs_in() {
    let transport = MockTransport::scripted(vec![json_response(201, json!({ "token": TOKEN, "user": sample_user("u9", false) }))]);
    let auth = service(transport.clone(), false);

    auth.register("  Asha ", " A@B.C", "secret1").await.unwrap();

    assert_eq!(transport.paths(), vec!["/auth/register".to_owned()]);
    assert_eq!(transport.last().body, Some(json!({ "name": "Asha", "email": "a@b.c", "password": "secret1" })));
    assert_eq!(auth.current_user().map(|u| u.id).as_deref(), Some("u9"));
}

// =============================================================================
// SESSION CHECKS
// =============================================================================

#[tokio::test]
async fn check_auth_without_credentials_makes_no_request() {
    let transport = MockTransport::scripted(vec![]);
    let auth = service(transport.clone(), false);
    assert_eq!(auth.check_auth().await, None);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn check_auth_refreshes_user() {
    let mut fresh = sample_user("u1", true);
    fresh.name = "Renamed".into();
    let transport = MockTransport::scripted(vec![json_response(200, json!(fresh))]);
    let auth = service(transport.clone(), false);
    auth.set_auth_token(TOKEN, sample_user("u1", false)).unwrap();

    let user = auth.check_auth().await.unwrap();

    assert_eq!(user.name, "Renamed");
    assert!(auth.sessions().is_admin());
    let sent = transport.last();
    assert_eq!(transport.paths(), vec!["/auth/me".to_owned()]);
    assert_eq!(sent.timeout, auth.timeouts.auth_check);
    assert_eq!(sent.header("Authorization"), Some(&*format!("Bearer {TOKEN}")));
}

#[tokio::test]
async fn check_auth_accepts_wrapped_user() {
    let transport = MockTransport::scripted(vec![json_response(200, json!({ "user": sample_user("u1", false) }))]);
    let auth = service(transport, false);
    auth.set_auth_token(TOKEN, sample_user("u1", false)).unwrap();
    assert_eq!(auth.check_auth().await.map(|u| u.id).as_deref(), Some("u1"));
}

#[tokio::test]
async fn check_auth_failure_clears_session() {
    for outcome in [json_response(500, json!({})), Err(TransportError::Timeout)] {
        let auth = service(MockTransport::scripted(vec![outcome]), false);
        auth.set_auth_token(TOKEN, sample_user("u1", false)).unwrap();
        assert_eq!(auth.check_auth().await, None);
        assert!(!auth.sessions().is_authenticated());
    }
}

#[tokio::test]
async fn set_auth_token_rejects_malformed_token() {
    let auth = service(MockTransport::scripted(vec![]), false);
    let err = auth.set_auth_token("fallback-token-1", sample_user("u1", true)).unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));
    assert!(!auth.sessions().is_authenticated());
}

#[tokio::test]
async fn logout_clears_session() {
    let auth = service(MockTransport::scripted(vec![]), false);
    auth.set_auth_token(TOKEN, sample_user("u1", false)).unwrap();
    auth.logout();
    assert_eq!(auth.current_user(), None);
}

// =============================================================================
// ADMIN LOGIN
// =============================================================================

#[tokio::test]
async fn admin_login_uses_backend_when_reachable() {
    let auth = service(backend(|_| login_ok(&sample_user("a1", true))), true);

    let login = auth.admin_login("a1@example.test", "pw123456").await.unwrap();

    assert!(!login.fallback);
    assert_eq!(login.user.id, "a1");
    assert!(!auth.sessions().is_fallback());
    assert_eq!(auth.fallback().mode(), AuthMode::RealAuth);
}

#[tokio::test]
async fn admin_login_falls_back_when_backend_unreachable() {
    let transport = unreachable();
    let auth = service(transport.clone(), true);

    let login = auth.admin_login(DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_PASSWORD).await.unwrap();

    assert!(login.fallback);
    assert_eq!(login.user.id, FALLBACK_USER_ID);
    assert!(auth.sessions().is_fallback());
    assert_eq!(auth.sessions().bearer_token(), None);
    assert_eq!(transport.paths(), vec!["/health".to_owned()]);
}

#[tokio::test]
async fn admin_login_fallback_rejects_wrong_credentials() {
    let auth = service(unreachable(), true);
    let err = auth.admin_login(DEFAULT_FALLBACK_EMAIL, "guess").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials (fallback mode)");
    assert!(!auth.sessions().is_authenticated());
}

#[tokio::test]
async fn backend_rejection_never_falls_back() {
    let auth = service(backend(|_| json_response(400, json!({ "message": "Invalid credentials" }))), true);
    let err = auth.admin_login(DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_PASSWORD).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert!(!auth.sessions().is_authenticated());
}

#[tokio::test]
async fn non_admin_never_falls_back() {
    let auth = service(backend(|_| login_ok(&sample_user("u1", false))), true);
    let err = auth.admin_login(DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::AccessDenied));
    assert!(!auth.sessions().is_fallback());
}

#[tokio::test]
async fn network_error_during_login_falls_back() {
    let auth = service(backend(|_| Err(TransportError::Network("reset by peer".into()))), true);
    let login = auth.admin_login(DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_PASSWORD).await.unwrap();
    assert!(login.fallback);
    assert_eq!(auth.fallback().mode(), AuthMode::FallbackAuth);
}

#[tokio::test]
async fn disabled_fallback_surfaces_unreachable() {
    let auth = service(unreachable(), false);
    let err = auth.admin_login(DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_PASSWORD).await.unwrap_err();
    assert!(matches!(err, AuthError::Api(ApiError::Unreachable { .. })));
    assert!(!auth.sessions().is_authenticated());
}

#[tokio::test]
async fn check_auth_keeps_fallback_session_offline() {
    let transport = unreachable();
    let auth = service(transport.clone(), true);
    auth.admin_login(DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_PASSWORD).await.unwrap();
    let calls = transport.calls();

    let user = auth.check_auth().await.unwrap();

    assert_eq!(user.id, FALLBACK_USER_ID);
    assert_eq!(transport.calls(), calls);
}
