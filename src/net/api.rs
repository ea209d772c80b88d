//! HTTP wrapper for the dashboard backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every feature call goes through [`ApiClient::request`]. Callers never touch
//! authorization: the wrapper reads the access token from persisted storage
//! and attaches it as a bearer header.
//!
//! ERROR HANDLING
//! ==============
//! - 401/403: the session is signed out, the navigator is sent to `/login`,
//!   and the call resolves `Ok(None)`. Feature code never sees these as errors.
//! - Other non-2xx: `ApiError::Http` carrying the body text verbatim, or
//!   `Error <status>` when the body is empty.
//! - 2xx with an empty or non-JSON body: `Ok(None)`.
//! - A response that arrives after the session generation changed is checked
//!   before any of the above. A late 401/403 resolves `Ok(None)` without
//!   signing out again, so it cannot end a newer session. Anything else is
//!   dropped as `ApiError::Superseded`.
//!
//! No retries. Every failure is final for that user action.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::ApiError;
use crate::config::AppConfig;
use crate::routes::{Navigator, Route};
use crate::state::SessionStore;

/// Method, body and extra headers for one request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Applied after the defaults; a matching name replaces the default.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self { method: Method::GET, ..Self::default() }
    }

    #[must_use]
    pub fn post(body: Value) -> Self {
        Self { method: Method::POST, body: Some(body), ..Self::default() }
    }

    #[must_use]
    pub fn put(body: Value) -> Self {
        Self { method: Method::PUT, body: Some(body), ..Self::default() }
    }

    #[must_use]
    pub fn delete() -> Self {
        Self { method: Method::DELETE, ..Self::default() }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Build a client bound to a session and a navigator.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &AppConfig, session: SessionStore, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeouts.request())
            .connect_timeout(config.timeouts.connect())
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_base_url.trim_end_matches('/').to_string(), session, navigator })
    }

    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send an authenticated request and return the JSON body, if any.
    ///
    /// # Errors
    ///
    /// See the module docs; 401/403 are not errors.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Option<Value>, ApiError> {
        let generation = self.session.generation();
        let headers = self.build_headers(&options.headers)?;
        let method = options.method;

        let mut builder = self.http.request(method.clone(), self.url(endpoint)).headers(headers);
        if let Some(body) = &options.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.inspect_err(|e| {
            warn!(%method, endpoint, error = %e, "api transport failure");
        })?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(%method, endpoint, status, "api response");

        if self.session.generation() != generation {
            if is_auth_failure(status) {
                debug!(%method, endpoint, status, "ignoring rejection of superseded session");
                return Ok(None);
            }
            debug!(%method, endpoint, "dropping response from superseded session");
            return Err(ApiError::Superseded);
        }

        if is_auth_failure(status) {
            self.session.force_sign_out();
            self.navigator.navigate(Route::Login);
            return Ok(None);
        }

        if !(200..300).contains(&status) {
            return Err(ApiError::Http { status, message: error_message(status, &text) });
        }

        Ok(parse_body(&text))
    }

    /// [`ApiClient::request`] decoding the body into `T`.
    ///
    /// # Errors
    ///
    /// Everything `request` returns, plus `ApiError::Decode` when the JSON
    /// body does not match `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let Some(value) = self.request(endpoint, options).await? else {
            return Ok(None);
        };
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Unauthenticated JSON POST used by login and registration.
    ///
    /// Authorization failures here mean bad credentials, not an expired
    /// session, so they surface as `ApiError::Http` and leave the session alone.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-2xx status, or a body that
    /// does not decode into `T`.
    pub async fn send_public<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(endpoint))
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(endpoint, status, "public api response");

        if !(200..300).contains(&status) {
            return Err(ApiError::Http { status, message: error_message(status, &text) });
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim().trim_start_matches('/'))
    }

    fn build_headers(&self, overrides: &[(String, String)]) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = self.session.access_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| ApiError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                reason: e.to_string(),
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        for (name, value) in overrides {
            let header_name = HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|e| ApiError::InvalidHeader { name: name.clone(), reason: e.to_string() })?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidHeader { name: name.clone(), reason: e.to_string() })?;
            headers.insert(header_name, header_value);
        }
        Ok(headers)
    }
}

fn is_auth_failure(status: u16) -> bool {
    matches!(status, 401 | 403)
}

fn error_message(status: u16, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() { format!("Error {status}") } else { trimmed.to_string() }
}

fn parse_body(text: &str) -> Option<Value> {
    if text.trim().is_empty() {
        return None;
    }
    serde_json::from_str(text).ok()
}
