//! Login, registration and user-initiated logout.
//!
//! Credentials go through the public path of the HTTP wrapper: a 401 from
//! `/auth/login` means a bad password, not an expired session, so it is
//! returned to the caller instead of triggering the global sign-out.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use serde::Serialize;
use tracing::info;

use super::{FeatureError, ValidationError, required};
use crate::net::ApiClient;
use crate::net::types::{AuthResponse, Identity};
use crate::routes::{Navigator, Route};
use crate::state::SessionStore;

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct Registration<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

/// Exchange credentials for an identity and install it in the session.
///
/// # Errors
///
/// Returns a validation error for blank fields, or the backend's rejection.
pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<Identity, FeatureError> {
    let email = required("email", email)?;
    if password.is_empty() {
        return Err(ValidationError::Required("password").into());
    }
    let response: AuthResponse = api
        .send_public("/auth/login", &Credentials { email: &email, password })
        .await?;
    Ok(install(api.session(), response))
}

/// Create an account and log straight into it.
///
/// # Errors
///
/// Returns a validation error for blank fields, or the backend's rejection
/// (for example an email that is already registered).
pub async fn register(api: &ApiClient, name: &str, email: &str, password: &str) -> Result<Identity, FeatureError> {
    let name = required("name", name)?;
    let email = required("email", email)?;
    if password.is_empty() {
        return Err(ValidationError::Required("password").into());
    }
    let response: AuthResponse = api
        .send_public("/auth/register", &Registration { name: &name, email: &email, password })
        .await?;
    Ok(install(api.session(), response))
}

/// Navbar logout: clear the session and go to the login screen.
pub fn logout(session: &SessionStore, navigator: &dyn Navigator) {
    session.logout();
    navigator.navigate(Route::Login);
}

fn install(session: &SessionStore, response: AuthResponse) -> Identity {
    let identity = Identity::from(response);
    info!(user_id = identity.id, "credentials accepted");
    session.login(identity.clone());
    identity
}
