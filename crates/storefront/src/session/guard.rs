//! Route gating for the admin and profile namespaces.

use super::SessionState;

pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Where a visitor to `path` must be sent instead, if anywhere.
///
/// Nothing is redirected while the session is still initializing.
#[must_use]
pub fn guard(path: &str, state: &SessionState) -> Option<&'static str> {
    if state.is_loading {
        return None;
    }

    let path = path.split(['?', '#']).next().unwrap_or(path);
    let identity = state.identity.as_ref();

    if path.starts_with("/admin") && path != ADMIN_LOGIN_PATH {
        if !identity.is_some_and(super::Identity::is_admin) {
            return Some(ADMIN_LOGIN_PATH);
        }
    } else if path.starts_with("/profile") {
        if identity.is_none() {
            return Some(LOGIN_PATH);
        }
    } else if path == LOGIN_PATH && identity.is_some() {
        return Some(HOME_PATH);
    }

    None
}
