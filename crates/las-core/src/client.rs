//! Client facade
//!
//! [`Client`] wires credentials, signer, transport and executor together and
//! is what endpoint methods hang off. Every collaborator can be replaced
//! through [`ClientBuilder`].

use crate::config::ClientConfig;
use crate::credentials::{endpoint_host, Credentials, DEFAULT_API_ENDPOINT};
use crate::http::{
    create_signer, ClientCredentialsProvider, CredentialProvider, Method, ReqwestTransport,
    RequestBuilder, RequestExecutor, RequestSigner, Transport,
};
use crate::serializer::{JsonSerializer, Serializer};
use crate::time::{Sleeper, TokioSleeper};
use crate::{Error, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Async client for the LAS API
#[derive(Debug)]
pub struct Client {
    executor: RequestExecutor,
}

impl Client {
    /// Create a client from explicit credentials and default configuration
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder().credentials(credentials).build()
    }

    /// Create a client from the environment and the default credentials file
    pub fn from_default_credentials() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Base URL requests are sent to
    pub fn api_endpoint(&self) -> &str {
        self.executor.api_endpoint()
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Execute a request assembled by an endpoint method
    pub async fn execute(&self, request: RequestBuilder) -> Result<Value> {
        self.executor.execute(request).await
    }

    /// Execute a request that resolves to [`Error::Cancelled`] when `cancel` fires
    pub async fn execute_with_cancel(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        self.executor.execute_with_cancel(request, cancel).await
    }

    /// Call any path of the API
    ///
    /// Query entries are sent in order; repeat a key to send a list.
    pub async fn execute_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        let mut request = RequestBuilder::new(method, path);
        if let Some(body) = body {
            request = request.body(body);
        }
        for (key, value) in query {
            request = request.query(key, value);
        }
        self.execute(request).await
    }
}

/// Builder for [`Client`]
#[derive(Default)]
pub struct ClientBuilder {
    credentials: Option<Credentials>,
    profile: Option<String>,
    credentials_file: Option<PathBuf>,
    api_endpoint: Option<String>,
    provider: Option<Arc<dyn CredentialProvider>>,
    signer: Option<Arc<dyn RequestSigner>>,
    transport: Option<Arc<dyn Transport>>,
    serializer: Option<Arc<dyn Serializer>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    config: ClientConfig,
}

impl ClientBuilder {
    /// Use explicit credentials instead of loading them
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Credentials file profile to load
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Credentials file to load instead of the default location
    pub fn credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    /// Override the API endpoint
    pub fn api_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }

    /// Use a custom credential provider
    pub fn credential_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Use a custom signer; the signing scheme in the config is then ignored
    pub fn signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the client
    ///
    /// Credentials are loaded from the environment and credentials file only
    /// when no explicit credentials, credential provider or signer were given.
    pub fn build(self) -> Result<Client> {
        self.config.validate()?;

        let credentials = match (self.credentials, &self.provider) {
            (Some(credentials), _) => {
                credentials.validate()?;
                Some(credentials)
            }
            (None, Some(_)) => None,
            (None, None) if self.signer.is_some() => None,
            (None, None) => Some(Credentials::load_with_file(
                self.credentials_file.as_deref(),
                self.profile.as_deref(),
            )?),
        };

        let api_endpoint = self
            .api_endpoint
            .or_else(|| credentials.as_ref().map(|c| c.api_endpoint.clone()))
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string());

        let http = self.config.timeouts.http_client(&self.config.user_agent)?;

        let signer = match self.signer {
            Some(signer) => signer,
            None => {
                let provider: Arc<dyn CredentialProvider> = match (self.provider, &credentials) {
                    (Some(provider), _) => provider,
                    (None, Some(credentials)) => {
                        Arc::new(ClientCredentialsProvider::new(credentials, http.clone()))
                    }
                    (None, None) => {
                        return Err(Error::configuration("No credentials configured"));
                    }
                };
                let host = endpoint_host(&api_endpoint)?;
                create_signer(self.config.signing_scheme, provider, &host)
            }
        };

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new(http)));
        let serializer = self.serializer.unwrap_or_else(|| Arc::new(JsonSerializer));
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));

        tracing::debug!(
            api_endpoint = %api_endpoint,
            signing_scheme = ?self.config.signing_scheme,
            "Created LAS client"
        );

        let executor = RequestExecutor::new(api_endpoint, signer, transport, serializer)
            .with_retry_policy(self.config.retry_policy)
            .with_sleeper(sleeper);
        Ok(Client { executor })
    }
}
