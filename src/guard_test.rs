use super::*;
use crate::session::Session;
use crate::storage::MemoryStorage;
use crate::test_support::sample_user;
use std::sync::Arc;

fn state(user: Option<User>, loading: bool) -> AuthState {
    AuthState { user, loading }
}

#[test]
fn loading_wins_over_everything() {
    assert_eq!(check_access(&state(None, true), true), Access::Loading);
    assert_eq!(check_access(&state(Some(sample_user("u1", true)), true), false), Access::Loading);
}

#[test]
fn anonymous_user_goes_to_login() {
    let access = check_access(&state(None, false), false);
    assert_eq!(access, Access::RedirectLogin);
    assert_eq!(access.redirect_path(), Some("/login"));
    assert_eq!(access.message(), Some("Please login to access this page"));
}

#[test]
fn non_admin_never_reaches_admin_routes() {
    let customer = state(Some(sample_user("u1", false)), false);
    let access = check_access(&customer, true);
    assert_eq!(access, Access::RedirectHome);
    assert_eq!(access.redirect_path(), Some("/"));
    assert_eq!(check_access(&customer, false), Access::Allow);
}

#[test]
fn admin_is_allowed_everywhere() {
    let admin = state(Some(sample_user("a1", true)), false);
    assert_eq!(check_access(&admin, true), Access::Allow);
    assert_eq!(Access::Allow.redirect_path(), None);
}

#[test]
fn state_reads_from_session_store() {
    let sessions = SessionStore::new(Arc::new(MemoryStorage::new()), vec!["token".into()]);
    assert_eq!(AuthState::from_store(&sessions), AuthState::default());

    sessions.establish(Session::backend("aGVhZA.Ym9keQ.c2ln", sample_user("u1", false))).unwrap();
    let loaded = AuthState::from_store(&sessions);
    assert_eq!(loaded.user.map(|u| u.id), Some("u1".to_owned()));
}
