//! Per-screen operations invoked by the views.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each module is a thin layer over [`crate::net::ApiClient`]: validate input
//! locally, send one request, decode the DTO. Authorization failures never
//! reach here as errors; the HTTP wrapper has already signed the session out,
//! and list operations come back empty while mutations come back `None`.

pub mod auth;
pub mod dashboard;
pub mod projects;
pub mod sites;
pub mod users;

use crate::net::ApiError;
use crate::util::wkt::WktError;

/// Input rejected before any request was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error(transparent)]
    Polygon(#[from] WktError),
    #[error("you cannot change your own role")]
    SelfRoleChange,
}

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FeatureError {
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Trimmed `value`, or `Required(field)` when nothing is left.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() { Err(ValidationError::Required(field)) } else { Ok(trimmed.to_string()) }
}
