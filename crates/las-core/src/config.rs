//! Client configuration
//!
//! Everything about a [`Client`](crate::Client) that is not a credential:
//! retry behaviour, transport timeouts, signing scheme and user agent.

use crate::http::{RetryPolicy, SigningScheme, TimeoutConfig};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default `User-Agent` sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("las-rust/", env!("CARGO_PKG_VERSION"));

/// Main client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Retry policy applied to every call
    pub retry_policy: RetryPolicy,

    /// Connect and request timeouts of the HTTP transport
    pub timeouts: TimeoutConfig,

    /// How requests are authenticated
    pub signing_scheme: SigningScheme,

    /// `User-Agent` header value
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            timeouts: TimeoutConfig::default(),
            signing_scheme: SigningScheme::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_signing_scheme(mut self, scheme: SigningScheme) -> Self {
        self.signing_scheme = scheme;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Check the configuration for invalid values
    pub fn validate(&self) -> Result<()> {
        self.timeouts.validate()?;

        if self.user_agent.trim().is_empty() {
            return Err(Error::configuration("User agent cannot be empty"));
        }

        if self.retry_policy.throttle_schedule.iter().any(|d| d.is_zero()) {
            return Err(Error::configuration(
                "Throttle backoff delays must be greater than zero",
            ));
        }

        Ok(())
    }
}
