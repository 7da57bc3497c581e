//! Timeout configuration for the HTTP transport

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout configuration for HTTP requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout - time to establish a connection
    pub connect_timeout: Duration,
    /// Request timeout - total time for one send attempt
    pub request_timeout: Duration,
    /// Idle timeout for pooled connections
    pub pool_idle_timeout: Option<Duration>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            pool_idle_timeout: Some(Duration::from_secs(90)),
        }
    }
}

impl TimeoutConfig {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
            ..Default::default()
        }
    }

    /// Preset for large uploads such as document content
    pub fn slow() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
            pool_idle_timeout: Some(Duration::from_secs(300)),
        }
    }

    /// Override the request timeout
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate timeout configuration
    pub fn validate(&self) -> Result<()> {
        if self.connect_timeout.is_zero() {
            return Err(Error::configuration("Connect timeout cannot be zero"));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::configuration("Request timeout cannot be zero"));
        }

        if self.request_timeout < self.connect_timeout {
            return Err(Error::configuration(
                "Request timeout must be at least the connect timeout",
            ));
        }

        Ok(())
    }

    /// Build a reqwest client honoring these timeouts
    pub fn http_client(&self, user_agent: &str) -> Result<reqwest::Client> {
        self.validate()?;

        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(user_agent);
        if let Some(idle) = self.pool_idle_timeout {
            builder = builder.pool_idle_timeout(idle);
        }

        builder.build().map_err(|e| Error::Configuration {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(e.into()),
        })
    }
}
