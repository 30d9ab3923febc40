use std::collections::{HashMap, HashSet};

use axum::{extract::Request, middleware::Next, response::Response};
use once_cell::sync::Lazy;

use crate::error::ApiError;
use crate::store::{CurrentUser, Role};

pub const ASSETS_READ: &str = "assets:read";
pub const ASSETS_MANAGE: &str = "assets:manage";
pub const USERS_MANAGE: &str = "users:manage";
pub const REPORTS_VIEW: &str = "reports:view";

/// Static role to permission-set mapping, fixed at process start. `Admin`
/// is intentionally absent: it bypasses the lookup entirely. A role missing
/// from the map holds no permissions.
static ROLE_PERMISSIONS: Lazy<HashMap<Role, HashSet<&'static str>>> = Lazy::new(|| {
    HashMap::from([
        (
            Role::Manager,
            HashSet::from([ASSETS_READ, ASSETS_MANAGE, REPORTS_VIEW]),
        ),
        (Role::Technician, HashSet::from([ASSETS_READ, ASSETS_MANAGE])),
        (Role::Viewer, HashSet::from([ASSETS_READ])),
    ])
});

/// Conjunctive permission check: every required permission must be granted.
pub fn role_allows(role: Role, required: &[&str]) -> bool {
    if role == Role::Admin {
        return true;
    }
    let granted = ROLE_PERMISSIONS.get(&role);
    required
        .iter()
        .all(|p| granted.map_or(false, |set| set.contains(p)))
}

/// Role gate middleware. Runs strictly after [`super::auth::require_auth`];
/// a request without an authenticated principal is a 401, while an
/// authenticated principal lacking a permission is a 403.
pub async fn check_permissions(
    required: &'static [&'static str],
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let current = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !role_allows(current.role, required) {
        return Err(ApiError::forbidden(format!(
            "Role '{}' lacks a required permission ({})",
            current.role.as_str(),
            required.join(", ")
        )));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_bypasses_every_check() {
        assert!(role_allows(Role::Admin, &[USERS_MANAGE]));
        assert!(role_allows(Role::Admin, &[ASSETS_MANAGE, REPORTS_VIEW]));
        assert!(role_allows(Role::Admin, &["not-even-a-real-permission"]));
    }

    #[test]
    fn check_is_conjunctive() {
        assert!(role_allows(Role::Manager, &[ASSETS_READ, ASSETS_MANAGE]));
        assert!(!role_allows(Role::Manager, &[ASSETS_MANAGE, USERS_MANAGE]));
    }

    #[test]
    fn viewer_cannot_manage_assets() {
        assert!(role_allows(Role::Viewer, &[ASSETS_READ]));
        assert!(!role_allows(Role::Viewer, &[ASSETS_MANAGE]));
    }

    #[test]
    fn empty_requirement_gates_on_auth_only() {
        assert!(role_allows(Role::Viewer, &[]));
        assert!(role_allows(Role::Technician, &[]));
    }
}
