//! Errors produced by the HTTP wrapper.

/// Failures a caller of [`crate::net::api::ApiClient`] can observe.
///
/// Authorization failures (401/403) are deliberately absent: the wrapper
/// handles them by signing the session out and resolving with no value.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("unable to reach the server: {0}")]
    Network(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The body was valid JSON but not the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The response belongs to a session that has since been replaced.
    #[error("response discarded: session changed while the request was in flight")]
    Superseded,

    /// A caller-supplied header could not be encoded.
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),
}

impl ApiError {
    /// HTTP status when the backend produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout } else { Self::Network(err.to_string()) }
    }
}
