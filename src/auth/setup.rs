//! Admin account bootstrap and diagnostics.
//!
//! These calls talk to the backend directly and never establish a session:
//! a probe login proves the credentials work without logging the operator
//! in. A 401 from the backend still clears the stored session, as it does for
//! every request, so probing with wrong credentials logs the operator out.

#[cfg(test)]
#[path = "setup_test.rs"]
mod setup_test;

use serde::Serialize;
use serde_json::{Value, json};

use super::AuthError;
use super::fallback::{DEFAULT_FALLBACK_EMAIL, DEFAULT_FALLBACK_NAME, DEFAULT_FALLBACK_PASSWORD};
use crate::api::endpoints;
use crate::http::{ApiClient, ApiError, RequestOptions};
use crate::session::User;

#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Default for AdminCredentials {
    fn default() -> Self {
        Self {
            email: DEFAULT_FALLBACK_EMAIL.to_owned(),
            password: DEFAULT_FALLBACK_PASSWORD.to_owned(),
            name: DEFAULT_FALLBACK_NAME.to_owned(),
        }
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// Outcome of a diagnostic admin login.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProbe {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl AdminProbe {
    fn failed(error: impl Into<String>, status: Option<u16>) -> Self {
        Self { success: false, user: None, error: Some(error.into()), status }
    }
}

/// Register `credentials` as an admin, retrying once without the admin flag
/// for backends that refuse self-declared admins.
///
/// # Errors
///
/// Returns the error of the second attempt when both fail.
pub async fn create_admin_user(api: &ApiClient, credentials: &AdminCredentials) -> Result<User, AuthError> {
    let body = json!({
        "name": credentials.name,
        "email": credentials.email,
        "password": credentials.password,
        "isAdmin": true,
    });
    let options = RequestOptions::post(body).anonymous();
    let response: Value = match api.request(endpoints::REGISTER, options).await {
        Ok(response) => response,
        Err(error) => {
            tracing::info!(%error, "admin registration rejected, retrying without admin flag");
            let body = json!({
                "name": credentials.name,
                "email": credentials.email,
                "password": credentials.password,
            });
            api.request(endpoints::REGISTER, RequestOptions::post(body).anonymous()).await?
        }
    };

    let user = response
        .get("user")
        .and_then(|user| serde_json::from_value::<User>(user.clone()).ok())
        .ok_or(AuthError::InvalidResponse)?;
    if !user.is_admin {
        tracing::warn!(user_id = %user.id, "account created without admin privileges; grant them on the backend");
    }
    tracing::info!(user_id = %user.id, "admin account created");
    Ok(user)
}

/// Try an admin login without establishing a session. A 401 answer clears
/// any existing session.
pub async fn probe_admin_login(api: &ApiClient, email: &str, password: &str) -> AdminProbe {
    let options = RequestOptions::post(json!({ "email": email, "password": password })).anonymous();
    let response: Value = match api.request(endpoints::LOGIN, options).await {
        Ok(response) => response,
        Err(ApiError::Unreachable { message, .. }) => return AdminProbe::failed(format!("Network error: {message}"), None),
        Err(error) => return AdminProbe::failed(error.to_string(), error.status()),
    };

    match response.get("user").map(|user| serde_json::from_value::<User>(user.clone())) {
        Some(Ok(user)) if user.is_admin => AdminProbe { success: true, user: Some(user), error: None, status: Some(200) },
        Some(Ok(user)) => AdminProbe {
            user: Some(user),
            ..AdminProbe::failed("User exists but lacks admin privileges", Some(200))
        },
        _ => AdminProbe::failed("No user data returned", Some(200)),
    }
}

/// Probe the admin login; if it fails, create the account and probe again.
///
/// # Errors
///
/// Returns an error only when account creation itself fails.
pub async fn setup_admin_user(api: &ApiClient, credentials: &AdminCredentials) -> Result<AdminProbe, AuthError> {
    let probe = probe_admin_login(api, &credentials.email, &credentials.password).await;
    if probe.success {
        tracing::info!("admin login already works");
        return Ok(probe);
    }

    tracing::info!(error = ?probe.error, "admin login failed, creating admin account");
    create_admin_user(api, credentials).await?;
    Ok(probe_admin_login(api, &credentials.email, &credentials.password).await)
}
