//! Backend access: the authenticated HTTP wrapper, its errors and wire types.

pub mod api;
pub mod error;
pub mod types;

#[cfg(test)]
#[path = "helpers_test.rs"]
pub mod test_helpers;

pub use api::{ApiClient, RequestOptions};
pub use error::ApiError;
