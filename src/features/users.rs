//! User administration (admin screen).
//!
//! The backend enforces the admin check; this module adds the one rule the
//! screen owns: an admin may not change their own role. Identity is matched
//! by email, as the users listing shows it.

#[cfg(test)]
#[path = "users_test.rs"]
mod users_test;

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{FeatureError, ValidationError};
use crate::net::types::{Identity, Role, RolePayload, UserSummary};
use crate::net::{ApiClient, RequestOptions};

/// Response of `PUT /users/:id/role`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RoleUpdate {
    #[serde(default)]
    pub message: String,
    pub user: UserSummary,
}

/// # Errors
///
/// Returns the backend error if the listing fails.
pub async fn list(api: &ApiClient) -> Result<Vec<UserSummary>, FeatureError> {
    Ok(api
        .request_json::<Vec<UserSummary>>("/users", RequestOptions::get())
        .await?
        .unwrap_or_default())
}

/// Whether `acting` may change `target`'s role from this screen.
#[must_use]
pub fn can_change_role(acting: &Identity, target: &UserSummary) -> bool {
    !acting.email.eq_ignore_ascii_case(&target.email)
}

/// Set `target`'s role.
///
/// # Errors
///
/// Returns `SelfRoleChange` when `target` is the acting admin, or the
/// backend error.
pub async fn set_role(
    api: &ApiClient,
    acting: &Identity,
    target: &UserSummary,
    role: Role,
) -> Result<Option<RoleUpdate>, FeatureError> {
    if !can_change_role(acting, target) {
        return Err(ValidationError::SelfRoleChange.into());
    }
    let updated = api
        .request_json::<RoleUpdate>(&format!("/users/{}/role", target.id), RequestOptions::put(json!(RolePayload { role })))
        .await?;
    if updated.is_some() {
        info!(user_id = target.id, role = %role, "role changed");
    }
    Ok(updated)
}

/// Flip `target` between user and admin.
///
/// # Errors
///
/// Same as [`set_role`].
pub async fn toggle_role(
    api: &ApiClient,
    acting: &Identity,
    target: &UserSummary,
) -> Result<Option<RoleUpdate>, FeatureError> {
    set_role(api, acting, target, target.role.toggled()).await
}
