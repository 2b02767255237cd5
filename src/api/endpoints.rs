//! Backend endpoint paths, relative to the configured base URL.

#[cfg(test)]
#[path = "endpoints_test.rs"]
mod endpoints_test;

use std::fmt::Write;

pub const LOGIN: &str = "/auth/login";
pub const REGISTER: &str = "/auth/register";
pub const ME: &str = "/auth/me";

pub const PRODUCTS: &str = "/products";
pub const ORDERS: &str = "/orders";
pub const USER_STATS: &str = "/orders/user-stats";

pub const USER_PROFILE: &str = "/users/profile";
pub const CHANGE_PASSWORD: &str = "/users/change-password";

pub const ADMIN_DASHBOARD: &str = "/admin/dashboard-stats";
pub const ADMIN_PRODUCTS: &str = "/admin/products";
pub const ADMIN_ORDERS: &str = "/admin/orders";
pub const ADMIN_ANALYTICS: &str = "/admin/analytics";
pub const ADMIN_REPORTS: &str = "/admin/reports";
pub const ADMIN_REPORTS_EXPORT: &str = "/admin/reports/export";
pub const ADMIN_USERS: &str = "/admin/users";
pub const ADMIN_SETTINGS: &str = "/admin/settings";

pub const NEWSLETTER_SUBSCRIBE: &str = "/newsletter/subscribe";
pub const PAYMENT_SETTINGS: &str = "/payment-settings";
pub const HEALTH: &str = "/health";

#[must_use]
pub fn product_detail(id: &str) -> String {
    format!("{PRODUCTS}/{}", segment(id))
}

#[must_use]
pub fn order_detail(id: &str) -> String {
    format!("{ORDERS}/{}", segment(id))
}

#[must_use]
pub fn admin_product(id: &str) -> String {
    format!("{ADMIN_PRODUCTS}/{}", segment(id))
}

#[must_use]
pub fn admin_order_status(id: &str) -> String {
    format!("{ADMIN_ORDERS}/{}/status", segment(id))
}

#[must_use]
pub fn admin_user(id: &str) -> String {
    format!("{ADMIN_USERS}/{}", segment(id))
}

#[must_use]
pub fn admin_user_admin_status(id: &str) -> String {
    format!("{ADMIN_USERS}/{}/admin-status", segment(id))
}

/// Percent-encode everything outside the RFC 3986 unreserved set so an id
/// can never add path segments or a query.
fn segment(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}
