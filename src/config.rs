//! Client configuration parsed from environment variables.
//!
//! All values have defaults so the binary runs against a local backend with
//! no setup. CLI flags layer on top of this in `main.rs`.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 5 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_STATE_FILE: &str = ".geodash/session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl HttpTimeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend base URL without a trailing slash.
    pub api_base_url: String,
    pub idle_timeout: Duration,
    pub timeouts: HttpTimeouts,
    /// Where the file storage backend keeps the persisted identity.
    pub state_file: PathBuf,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `GEODASH_API_URL`: default `http://localhost:8000`
    /// - `GEODASH_IDLE_TIMEOUT_SECS`: default 300
    /// - `GEODASH_REQUEST_TIMEOUT_SECS`: default 10
    /// - `GEODASH_CONNECT_TIMEOUT_SECS`: default 5
    /// - `GEODASH_STATE_FILE`: default `.geodash/session.json`
    #[must_use]
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("GEODASH_API_URL")
            .ok()
            .and_then(|raw| normalize_base_url(&raw))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let idle_secs = env_parse("GEODASH_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS);
        let timeouts = HttpTimeouts {
            request_secs: env_parse("GEODASH_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("GEODASH_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };
        let state_file = std::env::var("GEODASH_STATE_FILE")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_STATE_FILE), PathBuf::from);

        Self { api_base_url, idle_timeout: Duration::from_secs(idle_secs), timeouts, state_file }
    }

    /// Replace the base URL, ignoring blank overrides.
    #[must_use]
    pub fn with_api_base_url(mut self, raw: &str) -> Self {
        if let Some(url) = normalize_base_url(raw) {
            self.api_base_url = url;
        }
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            timeouts: HttpTimeouts::default(),
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn normalize_base_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
