//! Typed endpoint methods on [`Client`](crate::Client)
//!
//! Each method maps its parameters onto a [`RequestBuilder`] and hands it to
//! the executor. Optional parameters are left out when `None`; list filters
//! become repeated query entries; `attributes` are merged into the body
//! without overriding explicit fields.

mod app_clients;
mod assets;
mod batches;
mod documents;
mod logs;
mod models;
mod predictions;
mod secrets;
mod transitions;
mod users;
mod workflows;

pub use documents::{CreateDocument, DocumentFilter};
pub use logs::LogFilter;
pub use predictions::CreatePrediction;
pub use transitions::{CreateTransition, ExecutionQuery, UpdateTransition, UpdateTransitionExecution};
pub use workflows::{CreateWorkflow, UpdateWorkflow};

use crate::http::RequestBuilder;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

/// Free-form body fields merged into create and update requests
pub type Attributes = Map<String, Value>;

/// Pagination parameters shared by list endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub max_results: Option<u32>,
    pub next_token: Option<String>,
}

impl Page {
    pub fn new(max_results: Option<u32>, next_token: Option<String>) -> Self {
        Self {
            max_results,
            next_token,
        }
    }

    /// First page of at most `max_results` entries
    pub fn first(max_results: u32) -> Self {
        Self::new(Some(max_results), None)
    }

    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .query_opt("maxResults", self.max_results)
            .query_opt("nextToken", self.next_token.as_deref())
    }
}

/// Sort parameters of execution listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

impl Sort {
    pub(crate) fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .query_opt("sortBy", self.sort_by.as_deref())
            .query_opt("order", self.order.as_deref())
    }
}

pub(crate) fn encode_content(content: &[u8]) -> String {
    STANDARD.encode(content)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::http::{OutgoingRequest, RawResponse, StaticTokenProvider, Transport};
    use crate::{Client, Result};
    use async_trait::async_trait;
    use reqwest::Method;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub method: Method,
        pub path: String,
        pub query: Vec<(String, String)>,
        pub body: Option<Value>,
    }

    /// Transport that records requests and answers from a script, `{}` by default
    #[derive(Default)]
    pub struct RecordingTransport {
        pub requests: Mutex<Vec<Recorded>>,
        pub responses: Mutex<VecDeque<RawResponse>>,
    }

    impl RecordingTransport {
        pub fn scripted(responses: Vec<RawResponse>) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }

        pub fn last(&self) -> Recorded {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }

        pub fn all(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: OutgoingRequest<'_>) -> Result<RawResponse> {
            let body = if request.body.is_empty() {
                None
            } else {
                Some(serde_json::from_slice(request.body).unwrap())
            };
            self.requests.lock().unwrap().push(Recorded {
                method: request.method.clone(),
                path: request.url.path().to_string(),
                query: request.url.query_pairs().into_owned().collect(),
                body,
            });
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| RawResponse::new(200, "{}")))
        }
    }

    pub fn client(transport: Arc<RecordingTransport>) -> Client {
        Client::builder()
            .api_endpoint("https://api.lucidtech.ai/v1")
            .credential_provider(Arc::new(StaticTokenProvider::new("token", "key")))
            .transport(transport)
            .build()
            .unwrap()
    }

    pub fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}
