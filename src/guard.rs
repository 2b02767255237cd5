//! Access decision for protected routes.
//!
//! SYSTEM CONTEXT
//! ==============
//! Front-ends consult [`check_access`] before rendering a protected view; the
//! CLI uses it to gate the `admin` subcommands on the stored session.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use serde::Serialize;

use crate::session::{SessionStore, User};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Current user plus whether the initial auth check is still in flight.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl AuthState {
    #[must_use]
    pub fn from_store(sessions: &SessionStore) -> Self {
        Self { user: sessions.user(), loading: false }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Access {
    Loading,
    RedirectLogin,
    RedirectHome,
    Allow,
}

impl Access {
    /// Where to navigate, for the redirecting outcomes.
    #[must_use]
    pub fn redirect_path(self) -> Option<&'static str> {
        match self {
            Self::RedirectLogin => Some(LOGIN_PATH),
            Self::RedirectHome => Some(HOME_PATH),
            Self::Loading | Self::Allow => None,
        }
    }

    /// User-facing reason for a denial.
    #[must_use]
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::RedirectLogin => Some("Please login to access this page"),
            Self::RedirectHome => Some("Access denied. Admin privileges required."),
            Self::Loading | Self::Allow => None,
        }
    }
}

#[must_use]
pub fn check_access(state: &AuthState, require_admin: bool) -> Access {
    if state.loading {
        return Access::Loading;
    }
    match &state.user {
        None => Access::RedirectLogin,
        Some(user) if require_admin && !user.is_admin => Access::RedirectHome,
        Some(_) => Access::Allow,
    }
}
