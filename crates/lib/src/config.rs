//! Client configuration.

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::{
    constants::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS},
    remote::RetryPolicy,
};

/// Settings for talking to the Schol-AR service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the REST API without a trailing slash, e.g. `https://www.Schol-AR.io/api`.
    pub api_url: String,
    /// Upper bound for every single request.
    pub timeout: Duration,
    /// Retry behaviour for idempotent reads.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with default timeout and retries.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                url: api_url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

/// Invalid client settings.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("Request timeout must be greater than zero")]
    ZeroTimeout,
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err)
    }
}
