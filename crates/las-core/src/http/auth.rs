//! Access tokens and the providers that hand them out
//!
//! [`CredentialProvider`] is the seam the signers depend on. The production
//! implementation, [`ClientCredentialsProvider`], caches one token and
//! refreshes it through a [`TokenIssuer`] only when it is absent or expired.
//! The refresh runs while the cache lock is held, so callers that observe an
//! expired token at the same time wait for that single refresh and reuse its
//! result.

use crate::credentials::Credentials;
use crate::time::{Clock, SystemClock};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Most seconds shaved off the advertised token lifetime
const EXPIRY_MARGIN_SECS: i64 = 30;

/// A bearer token and the instant it stops being valid
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// Raw token value
    pub value: String,
    /// Expiry instant; `None` means the token never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    /// Create a token that expires at the given instant
    pub fn new(value: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Create a token from an `expires_in` lifetime relative to `now`
    ///
    /// The margin never exceeds half the lifetime, so short-lived tokens are
    /// still usable once cached.
    pub fn expiring_in(value: impl Into<String>, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        let margin = (expires_in_secs / 2).clamp(0, EXPIRY_MARGIN_SECS);
        let lifetime = (expires_in_secs - margin).max(0);
        Self::new(value, Some(now + ChronoDuration::seconds(lifetime)))
    }

    /// Whether the token can no longer be used at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Key material for the message-signing scheme
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// Identifier of the signing key
    pub key_id: String,
    /// Secret the signature is keyed with
    pub secret: String,
    /// Optional session token forwarded as a header
    pub session_token: Option<String>,
}

impl KeyMaterial {
    /// Create key material without a session token
    pub fn new(key_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
            session_token: None,
        }
    }

    /// Attach a session token
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key_id", &self.key_id)
            .field("secret", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Source of the authentication material used by request signers
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a valid access token, refreshing it if needed
    async fn access_token(&self) -> Result<String>;

    /// Static API key sent alongside the bearer token
    fn api_key(&self) -> &str;

    /// Key material for message signing, if this provider has any
    fn key_material(&self) -> Option<KeyMaterial> {
        None
    }
}

/// Issues fresh access tokens
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Obtain a new token; failures must be reported as [`Error::Auth`]
    async fn issue(&self) -> Result<AccessToken>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

/// OAuth2 client-credentials token issuer
pub struct OAuthTokenIssuer {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    clock: Arc<dyn Clock>,
}

impl OAuthTokenIssuer {
    /// Create an issuer for the credentials' auth endpoint
    pub fn new(credentials: &Credentials, http: reqwest::Client) -> Self {
        Self {
            http,
            token_url: Self::token_url(&credentials.auth_endpoint),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use a different clock for expiry computation
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Token URL for an auth endpoint given either as a bare host or a URL
    pub fn token_url(auth_endpoint: &str) -> String {
        let base = auth_endpoint.trim_end_matches('/');
        if base.contains("://") {
            format!("{}/oauth2/token", base)
        } else {
            format!("https://{}/oauth2/token", base)
        }
    }
}

#[async_trait]
impl TokenIssuer for OAuthTokenIssuer {
    async fn issue(&self) -> Result<AccessToken> {
        debug!(url = %self.token_url, "Requesting access token");

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::Auth {
                message: "Token endpoint unreachable".to_string(),
                source: Some(e.into()),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| Error::Auth {
            message: "Failed to read token response".to_string(),
            source: Some(e.into()),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Token request rejected");
            return Err(Error::auth(format!(
                "Token request failed with status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| Error::Auth {
            message: "Malformed token response".to_string(),
            source: Some(e.into()),
        })?;

        let now = self.clock.now();
        Ok(match token.expires_in {
            Some(expires_in) => AccessToken::expiring_in(token.access_token, expires_in, now),
            None => AccessToken::new(token.access_token, None),
        })
    }
}

/// Credential provider that caches one token and refreshes it on expiry
pub struct ClientCredentialsProvider {
    issuer: Arc<dyn TokenIssuer>,
    api_key: String,
    key_material: Option<KeyMaterial>,
    clock: Arc<dyn Clock>,
    token: Mutex<Option<AccessToken>>,
}

impl ClientCredentialsProvider {
    /// Create a provider issuing tokens from the credentials' auth endpoint
    pub fn new(credentials: &Credentials, http: reqwest::Client) -> Self {
        let issuer = OAuthTokenIssuer::new(credentials, http);
        Self::with_issuer(Arc::new(issuer), credentials.api_key.clone()).with_key_material(
            KeyMaterial::new(credentials.client_id.clone(), credentials.client_secret.clone()),
        )
    }

    /// Create a provider around any token issuer
    pub fn with_issuer(issuer: Arc<dyn TokenIssuer>, api_key: impl Into<String>) -> Self {
        Self {
            issuer,
            api_key: api_key.into(),
            key_material: None,
            clock: Arc::new(SystemClock),
            token: Mutex::new(None),
        }
    }

    /// Attach key material for the message-signing scheme
    pub fn with_key_material(mut self, key_material: KeyMaterial) -> Self {
        self.key_material = Some(key_material);
        self
    }

    /// Use a different clock for expiry checks
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the cache with an existing token
    pub fn with_token(self, token: AccessToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
            ..self
        }
    }
}

#[async_trait]
impl CredentialProvider for ClientCredentialsProvider {
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired(self.clock.now()) {
                return Ok(token.value.clone());
            }
            debug!(expires_at = ?token.expires_at, "Cached access token expired");
        }

        info!("Refreshing access token");
        let fresh = self.issuer.issue().await?;
        let value = fresh.value.clone();
        *cached = Some(fresh);
        Ok(value)
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn key_material(&self) -> Option<KeyMaterial> {
        self.key_material.clone()
    }
}

/// Provider with a fixed token that is never refreshed
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
    api_key: String,
    key_material: Option<KeyMaterial>,
}

impl StaticTokenProvider {
    /// Create a provider returning `token` forever
    pub fn new(token: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_key: api_key.into(),
            key_material: None,
        }
    }

    /// Attach key material for the message-signing scheme
    pub fn with_key_material(mut self, key_material: KeyMaterial) -> Self {
        self.key_material = Some(key_material);
        self
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn key_material(&self) -> Option<KeyMaterial> {
        self.key_material.clone()
    }
}
