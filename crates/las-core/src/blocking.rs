//! Synchronous client
//!
//! Wraps the async [`Client`](crate::Client) and drives it on a
//! current-thread runtime owned by this struct. Must not be used from inside
//! an async context.

use crate::client::ClientBuilder;
use crate::credentials::Credentials;
use crate::endpoints::{CreateDocument, CreatePrediction, DocumentFilter, Page};
use crate::http::{Method, RequestBuilder};
use crate::{Error, Result};
use serde_json::Value;
use tokio::runtime::Runtime;

/// Blocking client for the LAS API
#[derive(Debug)]
pub struct Client {
    inner: crate::Client,
    runtime: Runtime,
}

impl Client {
    /// Create a client from explicit credentials
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::from_builder(crate::Client::builder().credentials(credentials))
    }

    /// Create a client from the environment and the default credentials file
    pub fn from_default_credentials() -> Result<Self> {
        Self::from_builder(crate::Client::builder())
    }

    /// Build the async client and a runtime to drive it
    pub fn from_builder(builder: ClientBuilder) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Configuration {
                message: format!("Failed to create runtime: {}", e),
                source: Some(e.into()),
            })?;
        let inner = builder.build()?;
        Ok(Self { inner, runtime })
    }

    /// The wrapped async client
    pub fn inner(&self) -> &crate::Client {
        &self.inner
    }

    pub fn execute(&self, request: RequestBuilder) -> Result<Value> {
        self.runtime.block_on(self.inner.execute(request))
    }

    pub fn execute_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(&str, &str)],
    ) -> Result<Value> {
        self.runtime
            .block_on(self.inner.execute_raw(method, path, body, query))
    }

    pub fn create_document(&self, params: CreateDocument) -> Result<Value> {
        self.runtime.block_on(self.inner.create_document(params))
    }

    pub fn list_documents(&self, filter: &DocumentFilter, page: &Page) -> Result<Value> {
        self.runtime.block_on(self.inner.list_documents(filter, page))
    }

    pub fn get_document(&self, document_id: &str) -> Result<Value> {
        self.runtime.block_on(self.inner.get_document(document_id))
    }

    pub fn create_prediction(&self, params: CreatePrediction) -> Result<Value> {
        self.runtime.block_on(self.inner.create_prediction(params))
    }

    pub fn list_assets(&self, page: &Page) -> Result<Value> {
        self.runtime.block_on(self.inner.list_assets(page))
    }

    pub fn send_heartbeat(&self, transition_id: &str, execution_id: &str) -> Result<Value> {
        self.runtime
            .block_on(self.inner.send_heartbeat(transition_id, execution_id))
    }
}
