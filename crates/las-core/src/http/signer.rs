//! Request signing
//!
//! Supports two authentication schemes:
//! - Bearer: `Authorization: Bearer <token>` plus `X-Api-Key`
//! - Message signing: HMAC-SHA256 over method, path, host, body hash and
//!   timestamp, emitted as a set of `X-Las-*` headers
//!
//! Both always set `Content-Type: application/json`. Signers are invoked once
//! per send attempt; headers are never reused across retries.

use crate::http::auth::CredentialProvider;
use crate::time::{Clock, SystemClock};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Header set produced by a signer
pub type Headers = BTreeMap<String, String>;

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_API_KEY: &str = "X-Api-Key";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_HOST: &str = "Host";
pub const HEADER_DATE: &str = "X-Las-Date";
pub const HEADER_CONTENT_SHA256: &str = "X-Las-Content-Sha256";
pub const HEADER_SECURITY_TOKEN: &str = "X-Las-Security-Token";

/// Algorithm tag of the message-signing scheme
pub const SIGNING_ALGORITHM: &str = "LAS-HMAC-SHA256";

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Produces authentication headers for one send attempt
#[async_trait]
pub trait RequestSigner: Send + Sync {
    /// Sign a request; `path` is the absolute URL path including any stage prefix
    async fn sign(&self, method: &Method, path: &str, body: &[u8]) -> Result<Headers>;
}

/// Authentication scheme selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SigningScheme {
    /// Bearer token plus API key header
    #[default]
    Bearer,
    /// HMAC message signature headers
    MessageSignature,
}

/// Bearer token signer
pub struct BearerSigner {
    provider: Arc<dyn CredentialProvider>,
}

impl BearerSigner {
    /// Create a signer drawing tokens from `provider`
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl RequestSigner for BearerSigner {
    async fn sign(&self, _method: &Method, _path: &str, _body: &[u8]) -> Result<Headers> {
        let token = self.provider.access_token().await?;

        let mut headers = Headers::new();
        headers.insert(HEADER_AUTHORIZATION.to_string(), format!("Bearer {}", token));
        headers.insert(HEADER_API_KEY.to_string(), self.provider.api_key().to_string());
        headers.insert(HEADER_CONTENT_TYPE.to_string(), "application/json".to_string());
        Ok(headers)
    }
}

/// HMAC-SHA256 message signer
pub struct MessageSigner {
    provider: Arc<dyn CredentialProvider>,
    host: String,
    clock: Arc<dyn Clock>,
}

impl MessageSigner {
    /// Create a signer for requests sent to `host`
    pub fn new(provider: Arc<dyn CredentialProvider>, host: impl Into<String>) -> Self {
        Self {
            provider,
            host: host.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different clock for request timestamps
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sign with an explicit timestamp
    pub fn sign_at(
        &self,
        method: &Method,
        path: &str,
        body: &[u8],
        at: DateTime<Utc>,
    ) -> Result<Headers> {
        let key = self.provider.key_material().ok_or_else(|| Error::Signing {
            message: "Credential provider has no key material for message signing".to_string(),
        })?;

        let timestamp = at.format(TIMESTAMP_FORMAT).to_string();
        let content_hash = hex::encode(Sha256::digest(body));
        let canonical = canonical_request(method, path, &self.host, &timestamp, &content_hash);
        let string_to_sign = format!(
            "{}\n{}\n{}",
            SIGNING_ALGORITHM,
            timestamp,
            hex::encode(Sha256::digest(canonical.as_bytes()))
        );

        let mut mac = HmacSha256::new_from_slice(key.secret.as_bytes()).map_err(|e| {
            Error::Signing {
                message: format!("Failed to create HMAC: {}", e),
            }
        })?;
        mac.update(string_to_sign.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let mut headers = Headers::new();
        headers.insert(
            HEADER_AUTHORIZATION.to_string(),
            format!(
                "{} Credential={}, SignedHeaders=host;x-las-content-sha256;x-las-date, Signature={}",
                SIGNING_ALGORITHM, key.key_id, signature
            ),
        );
        headers.insert(HEADER_HOST.to_string(), self.host.clone());
        headers.insert(HEADER_DATE.to_string(), timestamp);
        headers.insert(HEADER_CONTENT_SHA256.to_string(), content_hash);
        headers.insert(HEADER_CONTENT_TYPE.to_string(), "application/json".to_string());
        if let Some(session_token) = key.session_token {
            headers.insert(HEADER_SECURITY_TOKEN.to_string(), session_token);
        }
        Ok(headers)
    }
}

#[async_trait]
impl RequestSigner for MessageSigner {
    async fn sign(&self, method: &Method, path: &str, body: &[u8]) -> Result<Headers> {
        self.sign_at(method, path, body, self.clock.now())
    }
}

/// Canonical form of the signed request parts
fn canonical_request(
    method: &Method,
    path: &str,
    host: &str,
    timestamp: &str,
    content_hash: &str,
) -> String {
    format!(
        "{}\n{}\nhost:{}\nx-las-content-sha256:{}\nx-las-date:{}",
        method.as_str(),
        path,
        host,
        content_hash,
        timestamp
    )
}

/// Factory for the signer matching a scheme
pub fn create_signer(
    scheme: SigningScheme,
    provider: Arc<dyn CredentialProvider>,
    host: &str,
) -> Arc<dyn RequestSigner> {
    match scheme {
        SigningScheme::Bearer => Arc::new(BearerSigner::new(provider)),
        SigningScheme::MessageSignature => Arc::new(MessageSigner::new(provider, host)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::auth::{KeyMaterial, StaticTokenProvider};
    use chrono::TimeZone;

    fn provider() -> Arc<dyn CredentialProvider> {
        Arc::new(
            StaticTokenProvider::new("token-abc", "api-key-1")
                .with_key_material(KeyMaterial::new("client-1", "s3cret")),
        )
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn test_bearer_headers() {
        let signer = BearerSigner::new(provider());
        let headers = signer.sign(&Method::GET, "/v1/assets", b"").await.unwrap();

        assert_eq!(headers.get(HEADER_AUTHORIZATION).unwrap(), "Bearer token-abc");
        assert_eq!(headers.get(HEADER_API_KEY).unwrap(), "api-key-1");
        assert_eq!(headers.get(HEADER_CONTENT_TYPE).unwrap(), "application/json");
    }

    #[tokio::test]
    async fn test_bearer_is_deterministic() {
        let signer = BearerSigner::new(provider());
        let first = signer.sign(&Method::POST, "/v1/documents", b"{}").await.unwrap();
        let second = signer.sign(&Method::POST, "/v1/documents", b"{}").await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_message_signature_headers() {
        let signer = MessageSigner::new(provider(), "api.lucidtech.ai");
        let headers = signer
            .sign_at(&Method::POST, "/v1/documents", br#"{"a":1}"#, at())
            .unwrap();

        assert_eq!(headers.get(HEADER_HOST).unwrap(), "api.lucidtech.ai");
        assert_eq!(headers.get(HEADER_DATE).unwrap(), "20240301T093000Z");
        assert_eq!(
            headers.get(HEADER_CONTENT_SHA256).unwrap(),
            &hex::encode(Sha256::digest(br#"{"a":1}"#))
        );
        let authorization = headers.get(HEADER_AUTHORIZATION).unwrap();
        assert!(authorization.starts_with("LAS-HMAC-SHA256 Credential=client-1, "));
        assert!(!headers.contains_key(HEADER_SECURITY_TOKEN));
        assert_eq!(headers.get(HEADER_CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_message_signature_is_deterministic() {
        let signer = MessageSigner::new(provider(), "api.lucidtech.ai");
        let first = signer.sign_at(&Method::PATCH, "/v1/assets/a1", b"{}", at()).unwrap();
        let second = signer.sign_at(&Method::PATCH, "/v1/assets/a1", b"{}", at()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_message_signature_covers_every_input() {
        let signer = MessageSigner::new(provider(), "api.lucidtech.ai");
        let base = signer.sign_at(&Method::POST, "/v1/a", b"{}", at()).unwrap();
        let signature = |headers: &Headers| headers.get(HEADER_AUTHORIZATION).cloned().unwrap();

        let other_method = signer.sign_at(&Method::PATCH, "/v1/a", b"{}", at()).unwrap();
        let other_path = signer.sign_at(&Method::POST, "/v1/b", b"{}", at()).unwrap();
        let other_body = signer.sign_at(&Method::POST, "/v1/a", b"[]", at()).unwrap();
        let other_time = signer
            .sign_at(&Method::POST, "/v1/a", b"{}", at() + chrono::Duration::seconds(1))
            .unwrap();

        assert_ne!(signature(&base), signature(&other_method));
        assert_ne!(signature(&base), signature(&other_path));
        assert_ne!(signature(&base), signature(&other_body));
        assert_ne!(signature(&base), signature(&other_time));
    }

    #[test]
    fn test_session_token_header() {
        let provider: Arc<dyn CredentialProvider> = Arc::new(
            StaticTokenProvider::new("t", "k").with_key_material(
                KeyMaterial::new("id", "secret").with_session_token("session-1"),
            ),
        );
        let headers = MessageSigner::new(provider, "host")
            .sign_at(&Method::GET, "/", b"", at())
            .unwrap();
        assert_eq!(headers.get(HEADER_SECURITY_TOKEN).unwrap(), "session-1");
    }

    #[test]
    fn test_missing_key_material() {
        let provider: Arc<dyn CredentialProvider> = Arc::new(StaticTokenProvider::new("t", "k"));
        let err = MessageSigner::new(provider, "host")
            .sign_at(&Method::GET, "/", b"", at())
            .unwrap_err();
        assert!(matches!(err, Error::Signing { .. }));
    }
}
