//! Response classification
//!
//! Maps a raw transport result into a [`ClassifiedOutcome`]. The retry policy
//! matches on outcomes directly; only terminal outcomes are turned into
//! [`crate::Error`] values.

use crate::serializer::Serializer;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

/// Body marker of a per-second throttle response
pub const PER_SECOND_MARKER: &str = "Too Many Requests";
/// Body marker of an exhausted monthly quota
pub const PER_MONTH_MARKER: &str = "Limit Exceeded";
/// Message of the synthetic value returned for 204 responses
pub const ACKNOWLEDGEMENT_MESSAGE: &str = "request executed successfully";

/// Which limit a 429 response refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitScope {
    /// Too many requests in a short window; recoverable by waiting
    PerSecond,
    /// Monthly request quota used up
    PerMonth,
}

impl fmt::Display for RateLimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateLimitScope::PerSecond => write!(f, "per second"),
            RateLimitScope::PerMonth => write!(f, "per month"),
        }
    }
}

/// Status code and body bytes of a received response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Typed result of one send attempt
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifiedOutcome {
    /// 200 with a decodable body
    Success(Value),
    /// 204, no body
    EmptyAck,
    /// 403, credentials rejected
    Unauthorized { body: String },
    /// 429 with a recognised throttle marker
    RateLimited { scope: RateLimitScope, body: String },
    /// Any other non-200 status
    RequestError { status: u16, body: String },
    /// 200 whose body failed to decode
    DecodeError { raw_body: String, message: String },
    /// No response was received
    TransportError { cause: String },
}

impl ClassifiedOutcome {
    /// Short name used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedOutcome::Success(_) => "success",
            ClassifiedOutcome::EmptyAck => "empty_ack",
            ClassifiedOutcome::Unauthorized { .. } => "unauthorized",
            ClassifiedOutcome::RateLimited { .. } => "rate_limited",
            ClassifiedOutcome::RequestError { .. } => "request_error",
            ClassifiedOutcome::DecodeError { .. } => "decode_error",
            ClassifiedOutcome::TransportError { .. } => "transport_error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ClassifiedOutcome::Success(_) | ClassifiedOutcome::EmptyAck)
    }

    /// Resolve the outcome into the value or error handed to the caller
    pub fn into_result(self) -> Result<Value> {
        match self {
            ClassifiedOutcome::Success(value) => Ok(value),
            ClassifiedOutcome::EmptyAck => Ok(acknowledgement()),
            ClassifiedOutcome::Unauthorized { body } => Err(Error::Auth {
                message: format!("Credentials provided are not valid: {}", body),
                source: None,
            }),
            ClassifiedOutcome::RateLimited { scope, body } => {
                let message = match scope {
                    RateLimitScope::PerSecond => "You have reached the limit of requests per second",
                    RateLimitScope::PerMonth => {
                        "You have reached the limit of total requests per month"
                    }
                };
                Err(Error::RateLimit {
                    scope,
                    message: format!("{} ({})", message, body),
                })
            }
            ClassifiedOutcome::RequestError { status, body } => {
                Err(Error::Request { status, body })
            }
            ClassifiedOutcome::DecodeError { raw_body, message } => {
                Err(Error::Decode { message, raw_body })
            }
            ClassifiedOutcome::TransportError { cause } => Err(Error::transport(cause)),
        }
    }
}

/// Synthetic value returned for 204 responses
pub fn acknowledgement() -> Value {
    json!({ "message": ACKNOWLEDGEMENT_MESSAGE })
}

/// Classifies responses using the injected serializer for 200 bodies
#[derive(Clone)]
pub struct ErrorClassifier {
    serializer: Arc<dyn Serializer>,
}

impl ErrorClassifier {
    pub fn new(serializer: Arc<dyn Serializer>) -> Self {
        Self { serializer }
    }

    /// Classify a received response
    pub fn classify(&self, response: &RawResponse) -> ClassifiedOutcome {
        match response.status {
            204 => ClassifiedOutcome::EmptyAck,
            403 => ClassifiedOutcome::Unauthorized {
                body: response.text(),
            },
            429 => {
                let body = response.text();
                if body.contains(PER_SECOND_MARKER) {
                    ClassifiedOutcome::RateLimited {
                        scope: RateLimitScope::PerSecond,
                        body,
                    }
                } else if body.contains(PER_MONTH_MARKER) {
                    ClassifiedOutcome::RateLimited {
                        scope: RateLimitScope::PerMonth,
                        body,
                    }
                } else {
                    ClassifiedOutcome::RequestError { status: 429, body }
                }
            }
            200 => match self.serializer.decode(&response.body) {
                Ok(value) => ClassifiedOutcome::Success(value),
                Err(err) => ClassifiedOutcome::DecodeError {
                    raw_body: response.text(),
                    message: err.to_string(),
                },
            },
            status => ClassifiedOutcome::RequestError {
                status,
                body: response.text(),
            },
        }
    }

    /// Classify a send attempt that produced no response
    pub fn classify_failure(&self, cause: impl fmt::Display) -> ClassifiedOutcome {
        ClassifiedOutcome::TransportError {
            cause: cause.to_string(),
        }
    }
}

impl fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorClassifier").finish_non_exhaustive()
    }
}
