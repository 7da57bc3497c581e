//! Credential material and where it is loaded from
//!
//! Credentials are resolved field by field from, in priority order:
//! - Explicit values passed to [`Credentials::new`]
//! - Environment variables (`LAS_CLIENT_ID`, `LAS_CLIENT_SECRET`, `LAS_API_KEY`,
//!   `LAS_AUTH_ENDPOINT`, `LAS_API_ENDPOINT`)
//! - A TOML credentials file, `~/.lucidtech/credentials.toml` by default,
//!   with one table per profile
//!
//! ```toml
//! [default]
//! client_id = "..."
//! client_secret = "..."
//! api_key = "..."
//! auth_endpoint = "auth.lucidtech.ai"
//! api_endpoint = "https://api.lucidtech.ai/v1"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default API endpoint, including the stage prefix
pub const DEFAULT_API_ENDPOINT: &str = "https://api.lucidtech.ai/v1";

/// Default host of the token issuance service
pub const DEFAULT_AUTH_ENDPOINT: &str = "auth.lucidtech.ai";

/// Profile used when none is requested
pub const DEFAULT_PROFILE: &str = "default";

const ENV_CLIENT_ID: &str = "LAS_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "LAS_CLIENT_SECRET";
const ENV_API_KEY: &str = "LAS_API_KEY";
const ENV_AUTH_ENDPOINT: &str = "LAS_AUTH_ENDPOINT";
const ENV_API_ENDPOINT: &str = "LAS_API_ENDPOINT";

/// Keys and endpoints needed to talk to the API
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// OAuth client id, also the key id for message signing
    pub client_id: String,
    /// OAuth client secret, also the key material for message signing
    pub client_secret: String,
    /// Static API key sent with every request
    pub api_key: String,
    /// Host of the token issuance service
    pub auth_endpoint: String,
    /// Base URL every request path is appended to
    pub api_endpoint: String,
}

// Secrets stay out of Debug output so credentials can be traced safely.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("api_key", &"***")
            .field("auth_endpoint", &self.auth_endpoint)
            .field("api_endpoint", &self.api_endpoint)
            .finish()
    }
}

/// Credentials where any field may still be missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub api_key: Option<String>,
    pub auth_endpoint: Option<String>,
    pub api_endpoint: Option<String>,
}

impl PartialCredentials {
    /// Read the `LAS_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            client_id: get(ENV_CLIENT_ID),
            client_secret: get(ENV_CLIENT_SECRET),
            api_key: get(ENV_API_KEY),
            auth_endpoint: get(ENV_AUTH_ENDPOINT),
            api_endpoint: get(ENV_API_ENDPOINT),
        }
    }

    /// Read one profile from a TOML credentials file
    pub fn from_file(path: &Path, profile: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Configuration {
            message: format!("Failed to read credentials file {}", path.display()),
            source: Some(e.into()),
        })?;
        Self::from_toml_str(&content, profile).map_err(|e| match e {
            Error::Configuration { message, source } => Error::Configuration {
                message: format!("{} ({})", message, path.display()),
                source,
            },
            other => other,
        })
    }

    /// Parse one profile out of TOML credentials content
    pub fn from_toml_str(content: &str, profile: &str) -> Result<Self> {
        let mut profiles: HashMap<String, PartialCredentials> = toml::from_str(content)
            .map_err(|e| Error::Configuration {
                message: "Invalid credentials file".to_string(),
                source: Some(e.into()),
            })?;
        profiles.remove(profile).ok_or_else(|| {
            Error::configuration(format!("Profile '{}' not found in credentials file", profile))
        })
    }

    /// Fill fields that are still missing from `other`
    pub fn or(self, other: PartialCredentials) -> Self {
        Self {
            client_id: self.client_id.or(other.client_id),
            client_secret: self.client_secret.or(other.client_secret),
            api_key: self.api_key.or(other.api_key),
            auth_endpoint: self.auth_endpoint.or(other.auth_endpoint),
            api_endpoint: self.api_endpoint.or(other.api_endpoint),
        }
    }

    /// Finish resolution, applying endpoint defaults
    pub fn resolve(self) -> Result<Credentials> {
        let mut missing = Vec::new();
        if self.client_id.is_none() {
            missing.push("client_id");
        }
        if self.client_secret.is_none() {
            missing.push("client_secret");
        }
        if self.api_key.is_none() {
            missing.push("api_key");
        }
        if !missing.is_empty() {
            return Err(Error::configuration(format!(
                "Missing credentials: {}",
                missing.join(", ")
            )));
        }

        let credentials = Credentials {
            client_id: self.client_id.unwrap_or_default(),
            client_secret: self.client_secret.unwrap_or_default(),
            api_key: self.api_key.unwrap_or_default(),
            auth_endpoint: self
                .auth_endpoint
                .unwrap_or_else(|| DEFAULT_AUTH_ENDPOINT.to_string()),
            api_endpoint: self
                .api_endpoint
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
        };
        credentials.validate()?;
        Ok(credentials)
    }
}

impl Credentials {
    /// Create credentials from explicit values
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        api_key: impl Into<String>,
        auth_endpoint: impl Into<String>,
        api_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            api_key: api_key.into(),
            auth_endpoint: auth_endpoint.into(),
            api_endpoint: api_endpoint.into(),
        }
    }

    /// Default credentials file location (`~/.lucidtech/credentials.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".lucidtech").join("credentials.toml"))
    }

    /// Resolve credentials from the environment and the default credentials file
    pub fn load(profile: Option<&str>) -> Result<Self> {
        Self::load_with_file(None, profile)
    }

    /// Resolve credentials from the environment and a specific credentials file
    ///
    /// Environment variables take precedence over the file. A missing default
    /// file is not an error as long as the environment is complete; a missing
    /// explicit file is.
    pub fn load_with_file(file: Option<&Path>, profile: Option<&str>) -> Result<Self> {
        let profile = profile.unwrap_or(DEFAULT_PROFILE);
        let from_env = PartialCredentials::from_env();

        let from_file = match file {
            Some(path) => PartialCredentials::from_file(path, profile)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => PartialCredentials::from_file(&path, profile)?,
                _ => PartialCredentials::default(),
            },
        };

        tracing::debug!(profile = profile, "Resolving credentials");
        from_env.or(from_file).resolve()
    }

    /// Check that every field is usable
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(Error::configuration("client_id cannot be empty"));
        }
        if self.client_secret.trim().is_empty() {
            return Err(Error::configuration("client_secret cannot be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(Error::configuration("api_key cannot be empty"));
        }
        if self.auth_endpoint.trim().is_empty() {
            return Err(Error::configuration("auth_endpoint cannot be empty"));
        }
        url::Url::parse(&self.api_endpoint).map_err(|e| Error::Configuration {
            message: format!("Invalid api_endpoint: {}", self.api_endpoint),
            source: Some(e.into()),
        })?;
        Ok(())
    }

    /// Host part of the API endpoint, used by the message-signing scheme
    pub fn api_host(&self) -> Result<String> {
        endpoint_host(&self.api_endpoint)
    }
}

/// Host, and port when explicit, of an endpoint URL
pub fn endpoint_host(endpoint: &str) -> Result<String> {
    let url = url::Url::parse(endpoint).map_err(|e| Error::Configuration {
        message: format!("Invalid api_endpoint: {}", endpoint),
        source: Some(e.into()),
    })?;
    let host = url
        .host_str()
        .ok_or_else(|| Error::configuration("api_endpoint has no host"))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
