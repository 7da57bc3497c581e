//! Request/response body encoding
//!
//! The executor never reaches for a process-wide JSON configuration; it is
//! handed a [`Serializer`] at construction and uses only that instance.

use crate::{Error, Result};
use serde_json::Value;

/// Encodes request bodies and decodes response bodies
pub trait Serializer: Send + Sync {
    /// Encode a JSON value into the bytes sent on the wire
    fn encode(&self, value: &Value) -> Result<Vec<u8>>;

    /// Decode a response body into a JSON value
    fn decode(&self, body: &[u8]) -> Result<Value>;
}

/// `serde_json` backed serializer
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// Create a new JSON serializer
    pub fn new() -> Self {
        Self
    }
}

impl Serializer for JsonSerializer {
    fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, body: &[u8]) -> Result<Value> {
        serde_json::from_slice(body).map_err(|e| Error::Decode {
            message: e.to_string(),
            raw_body: String::from_utf8_lossy(body).into_owned(),
        })
    }
}
