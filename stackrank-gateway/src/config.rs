//! Gateway configuration with sensible defaults.
//!
//! [`GatewayConfig`] controls where the backend lives, how long a single
//! round trip may take, and which User-Agent is sent.

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the backend base URL.
pub const API_URL_ENV: &str = "STACKRANK_API_URL";

/// Default backend location when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Configuration for the HTTP gateway.
///
/// Use [`Default::default()`] for a local backend, or construct with field
/// overrides for custom deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Backend root URL. Endpoints are resolved under `<base_url>/api/`.
    pub base_url: String,
    /// Per-request timeout in seconds. Applies to every call equally.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, `stackrank-gateway/<version>` is sent.
    pub user_agent: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout_seconds: 30,
            user_agent: None,
        }
    }
}

impl GatewayConfig {
    /// Create a config pointing at `base_url` with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout in seconds.
    pub fn with_timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = secs;
        self
    }

    /// Replace `base_url` with the value of [`API_URL_ENV`] when it is set
    /// and non-empty.
    pub fn with_env_override(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim();
            if !url.is_empty() {
                self.base_url = url.to_owned();
            }
        }
        self
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `base_url` parses as an absolute `http` or `https` URL
    /// - `timeout_seconds` must be greater than 0
    pub fn validate(&self) -> Result<(), GatewayError> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| GatewayError::Config(format!("base_url is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GatewayError::Config(format!(
                "base_url must use http or https, got `{}`",
                parsed.scheme()
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(GatewayError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
