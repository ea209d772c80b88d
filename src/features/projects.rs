//! Project listing, search and CRUD, plus timestamp display helpers.
//!
//! ERROR HANDLING
//! ==============
//! The backend restricts create/update/delete to admins and answers 403
//! otherwise, which the HTTP wrapper turns into a sign-out. Name validation
//! happens here so a blank name never costs a request.

#[cfg(test)]
#[path = "projects_test.rs"]
mod projects_test;

use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};
use tracing::info;

use super::{FeatureError, required};
use crate::net::types::{Project, ProjectPayload};
use crate::net::{ApiClient, RequestOptions};

/// All projects with their site references and area totals.
///
/// # Errors
///
/// Returns the backend error if the listing fails.
pub async fn list(api: &ApiClient) -> Result<Vec<Project>, FeatureError> {
    Ok(api
        .request_json::<Vec<Project>>("/projects", RequestOptions::get())
        .await?
        .unwrap_or_default())
}

/// Case-insensitive substring match over name and description. A blank
/// query keeps everything.
#[must_use]
pub fn filter<'a>(projects: &'a [Project], query: &str) -> Vec<&'a Project> {
    let needle = query.trim().to_lowercase();
    projects
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Create a project. `None` when the session was rejected mid-flight.
///
/// # Errors
///
/// Returns a validation error for a blank name, or the backend error.
pub async fn create(api: &ApiClient, name: &str, description: &str) -> Result<Option<Project>, FeatureError> {
    let payload = ProjectPayload { name: required("project name", name)?, description: description.trim().to_string() };
    let created = api
        .request_json::<Project>("/projects", RequestOptions::post(json!(payload)))
        .await?;
    if let Some(project) = &created {
        info!(project_id = project.id, "project created");
    }
    Ok(created)
}

/// Replace a project's name and description.
///
/// # Errors
///
/// Returns a validation error for a blank name, or the backend error.
pub async fn update(api: &ApiClient, id: i64, name: &str, description: &str) -> Result<Option<Project>, FeatureError> {
    let payload = ProjectPayload { name: required("project name", name)?, description: description.trim().to_string() };
    let updated = api
        .request_json::<Project>(&format!("/projects/{id}"), RequestOptions::put(json!(payload)))
        .await?;
    if updated.is_some() {
        info!(project_id = id, "project updated");
    }
    Ok(updated)
}

/// # Errors
///
/// Returns the backend error, e.g. 404 for an unknown project.
pub async fn delete(api: &ApiClient, id: i64) -> Result<(), FeatureError> {
    api.request(&format!("/projects/{id}"), RequestOptions::delete())
        .await?;
    info!(project_id = id, "project delete sent");
    Ok(())
}

// =============================================================================
// TIMESTAMPS
// =============================================================================

/// Parse a backend timestamp. Values without an offset are taken as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    OffsetDateTime::parse(raw, &Rfc3339)
        .or_else(|_| OffsetDateTime::parse(&format!("{raw}Z"), &Rfc3339))
        .ok()
}

/// `YYYY-MM-DD HH:MM:SS`, `-` when absent, the raw text when unparseable.
#[must_use]
pub fn format_timestamp(raw: Option<&str>) -> String {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return "-".to_string();
    };
    parse_timestamp(raw)
        .and_then(|at| {
            at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
                .ok()
        })
        .unwrap_or_else(|| raw.to_string())
}

/// Relative age: `Ns ago`, `Nm ago`, `Nh ago`, `Nd ago`, then the plain date
/// from seven days on. Future timestamps read as `0s ago`.
#[must_use]
pub fn time_ago(raw: Option<&str>, now: OffsetDateTime) -> String {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return "-".to_string();
    };
    let Some(at) = parse_timestamp(raw) else {
        return raw.to_string();
    };
    let elapsed = (now - at).max(Duration::ZERO);
    let secs = elapsed.whole_seconds();
    if secs < 60 {
        return format!("{secs}s ago");
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{days}d ago");
    }
    at.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| raw.to_string())
}
