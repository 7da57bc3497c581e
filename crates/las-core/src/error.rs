//! Error types for the LAS client library
//!
//! Every failure a caller can observe is one variant of [`Error`]. The retry
//! loop works on [`ClassifiedOutcome`](crate::http::ClassifiedOutcome) values
//! and only converts to an [`Error`] once an outcome is terminal.

use crate::http::RateLimitScope;
use thiserror::Error;

/// Main error type for LAS client operations
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials were rejected (403) or no access token could be issued
    #[error("Authentication failed: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The service throttled the request
    #[error("Rate limit exceeded ({scope}): {message}")]
    RateLimit {
        scope: RateLimitScope,
        message: String,
    },

    /// The service answered with an unexpected status code
    #[error("Request failed with status {status}: {body}")]
    Request {
        status: u16,
        body: String,
    },

    /// A 200 response carried a body that could not be decoded
    #[error("Failed to decode response body: {message}")]
    Decode {
        message: String,
        raw_body: String,
    },

    /// No response was received
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The call was cancelled before it resolved
    #[error("Request cancelled")]
    Cancelled,

    /// Missing or invalid configuration (credentials, endpoints, timeouts)
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The request signer could not produce headers
    #[error("Signing error: {message}")]
    Signing { message: String },

    /// JSON encoding errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error without a source
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create an authentication error without a source
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error without a source
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status code associated with this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::RateLimit { .. } => Some(429),
            Error::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error came from the network layer rather than the service
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. } | Error::Cancelled)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}
