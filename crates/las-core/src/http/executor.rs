//! Request execution with retry and tracing instrumentation
//!
//! Every API call runs through [`RequestExecutor`]:
//! build → sign → send → classify → (retry → sign → send → classify …) → resolve.
//! Each attempt is signed freshly, and the number of attempts is bounded by
//! the [`RetryPolicy`].

use crate::http::builder::{PreparedRequest, RequestBuilder};
use crate::http::error::{ClassifiedOutcome, ErrorClassifier, RawResponse};
use crate::http::retry::{RetryDecision, RetryHandler, RetryPolicy};
use crate::http::signer::{Headers, RequestSigner, HEADER_HOST};
use crate::serializer::Serializer;
use crate::time::{Sleeper, TokioSleeper};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// A fully signed request handed to the transport
#[derive(Debug, Clone)]
pub struct OutgoingRequest<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub headers: &'a Headers,
    pub body: &'a [u8],
}

/// Sends one request and returns the raw response
///
/// Failures to obtain a response must be reported as [`Error::Transport`];
/// any other error aborts the call without retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutgoingRequest<'_>) -> Result<RawResponse>;
}

/// Transport backed by `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn header_map(headers: &Headers) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(headers.len());
        for (key, value) in headers {
            // reqwest derives Host from the URL
            if key.eq_ignore_ascii_case(HEADER_HOST) {
                continue;
            }
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::configuration(format!("Invalid header name {}: {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::configuration(format!("Invalid value for header {}: {}", key, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutgoingRequest<'_>) -> Result<RawResponse> {
        let headers = Self::header_map(request.headers)?;
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(headers);
        if !request.body.is_empty() {
            builder = builder.body(request.body.to_vec());
        }

        let response = builder.send().await.map_err(|e| Error::Transport {
            message: format!("Failed to send request: {}", e),
            source: Some(e.into()),
        })?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| Error::Transport {
            message: format!("Failed to read response body: {}", e),
            source: Some(e.into()),
        })?;

        Ok(RawResponse::new(status, body.to_vec()))
    }
}

/// Orchestrates signing, sending, classification and retries
pub struct RequestExecutor {
    api_endpoint: String,
    signer: Arc<dyn RequestSigner>,
    transport: Arc<dyn Transport>,
    serializer: Arc<dyn Serializer>,
    classifier: ErrorClassifier,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    /// Create an executor with the default retry policy
    pub fn new(
        api_endpoint: impl Into<String>,
        signer: Arc<dyn RequestSigner>,
        transport: Arc<dyn Transport>,
        serializer: Arc<dyn Serializer>,
    ) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            signer,
            transport,
            classifier: ErrorClassifier::new(serializer.clone()),
            serializer,
            sleeper: Arc::new(TokioSleeper),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn api_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Build and execute a request
    pub async fn execute(&self, request: RequestBuilder) -> Result<Value> {
        let prepared = request.build(self.serializer.as_ref())?;
        self.execute_prepared(&prepared).await
    }

    /// Execute a request, resolving to [`Error::Cancelled`] once `cancel` fires
    ///
    /// Cancellation is observed while waiting on the transport, the signer or
    /// a backoff sleep.
    pub async fn execute_with_cancel(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("request cancelled");
                Err(Error::Cancelled)
            }
            result = self.execute(request) => result,
        }
    }

    /// Execute an already prepared request
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute_prepared(&self, request: &PreparedRequest) -> Result<Value> {
        let url = request.url(&self.api_endpoint)?;
        let mut retries = RetryHandler::new(self.policy.clone());

        loop {
            let attempt = retries.attempts().total();
            let Attempt { outcome, failure } = self.attempt(request, &url).await?;
            debug!(attempt, outcome = outcome.kind(), "attempt classified");

            match retries.next(&outcome) {
                RetryDecision::Retry { delay, reason } => {
                    warn!(
                        attempt,
                        outcome = outcome.kind(),
                        reason = ?reason,
                        delay_ms = delay.as_millis() as u64,
                        "retrying request"
                    );
                    self.sleeper.sleep(delay).await;
                }
                RetryDecision::NoRetry => {
                    if !outcome.is_success() {
                        error!(
                            attempt,
                            outcome = outcome.kind(),
                            "request failed, not retrying"
                        );
                    }
                    return match failure {
                        Some(err) => Err(err),
                        None => outcome.into_result(),
                    };
                }
            }
        }
    }

    /// Sign, send and classify once
    async fn attempt(&self, request: &PreparedRequest, url: &Url) -> Result<Attempt> {
        let headers = self
            .signer
            .sign(&request.method, url.path(), &request.body)
            .await?;

        let outgoing = OutgoingRequest {
            method: &request.method,
            url,
            headers: &headers,
            body: &request.body,
        };
        match self.transport.send(outgoing).await {
            Ok(response) => Ok(Attempt {
                outcome: self.classifier.classify(&response),
                failure: None,
            }),
            Err(Error::Transport { message, source }) => Ok(Attempt {
                outcome: self.classifier.classify_failure(&message),
                failure: Some(Error::Transport { message, source }),
            }),
            Err(err) => Err(err),
        }
    }
}

/// One classified attempt
///
/// A transport failure is kept as received so a terminal one reaches the
/// caller with its message and source intact.
struct Attempt {
    outcome: ClassifiedOutcome,
    failure: Option<Error>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("api_endpoint", &self.api_endpoint)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::RateLimitScope;
    use crate::serializer::JsonSerializer;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    struct SentRequest {
        method: Method,
        url: Url,
        headers: Headers,
        body: Vec<u8>,
    }

    #[derive(Default)]
    struct FakeTransport {
        responses: Mutex<VecDeque<Result<RawResponse>>>,
        sent: Mutex<Vec<SentRequest>>,
    }

    impl FakeTransport {
        fn with(responses: Vec<Result<RawResponse>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn repeating(response: RawResponse, times: usize) -> Arc<Self> {
            Self::with((0..times).map(|_| Ok(response.clone())).collect())
        }

        fn sent(&self) -> Vec<SentRequest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, request: OutgoingRequest<'_>) -> Result<RawResponse> {
            self.sent.lock().unwrap().push(SentRequest {
                method: request.method.clone(),
                url: request.url.clone(),
                headers: request.headers.clone(),
                body: request.body.to_vec(),
            });
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(Error::transport("no scripted response")))
        }
    }

    /// Signer that stamps each attempt with a sequence number
    #[derive(Default)]
    struct SequenceSigner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RequestSigner for SequenceSigner {
        async fn sign(&self, _method: &Method, path: &str, _body: &[u8]) -> Result<Headers> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let mut headers = Headers::new();
            headers.insert("Authorization".to_string(), format!("Bearer token-{}", n));
            headers.insert("X-Signed-Path".to_string(), path.to_string());
            Ok(headers)
        }
    }

    struct FailingSigner;

    #[async_trait]
    impl RequestSigner for FailingSigner {
        async fn sign(&self, _method: &Method, _path: &str, _body: &[u8]) -> Result<Headers> {
            Err(Error::auth("token endpoint unreachable"))
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    struct PendingSleeper;

    #[async_trait]
    impl Sleeper for PendingSleeper {
        async fn sleep(&self, _duration: Duration) {
            std::future::pending::<()>().await
        }
    }

    struct CountingSerializer {
        decodes: AtomicUsize,
    }

    impl Serializer for CountingSerializer {
        fn encode(&self, value: &Value) -> Result<Vec<u8>> {
            JsonSerializer.encode(value)
        }

        fn decode(&self, body: &[u8]) -> Result<Value> {
            self.decodes.fetch_add(1, Ordering::SeqCst);
            JsonSerializer.decode(body)
        }
    }

    struct Harness {
        executor: RequestExecutor,
        transport: Arc<FakeTransport>,
        signer: Arc<SequenceSigner>,
        sleeper: Arc<RecordingSleeper>,
    }

    impl Harness {
        fn new(transport: Arc<FakeTransport>) -> Self {
            Self::with_policy(transport, RetryPolicy::default())
        }

        fn with_policy(transport: Arc<FakeTransport>, policy: RetryPolicy) -> Self {
            let signer = Arc::new(SequenceSigner::default());
            let sleeper = Arc::new(RecordingSleeper::default());
            let executor = RequestExecutor::new(
                "https://api.lucidtech.ai/v1",
                signer.clone(),
                transport.clone(),
                Arc::new(JsonSerializer),
            )
            .with_retry_policy(policy)
            .with_sleeper(sleeper.clone());
            Self {
                executor,
                transport,
                signer,
                sleeper,
            }
        }

        fn slept(&self) -> Vec<Duration> {
            self.sleeper.slept.lock().unwrap().clone()
        }
    }

    fn throttled() -> RawResponse {
        RawResponse::new(429, r#"{"message": "Too Many Requests"}"#)
    }

    #[tokio::test]
    async fn test_success_returns_decoded_body() {
        let harness = Harness::new(FakeTransport::with(vec![Ok(RawResponse::new(
            200,
            r#"{"documentId":"d1","contentType":"image/jpeg","consentId":"c1"}"#,
        ))]));

        let value = harness
            .executor
            .execute(
                RequestBuilder::post("/documents")
                    .field("contentType", "image/jpeg")
                    .field("consentId", "c1"),
            )
            .await
            .unwrap();

        assert_eq!(value["documentId"], "d1");
        let sent = harness.transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].url.as_str(), "https://api.lucidtech.ai/v1/documents");
        let body: Value = serde_json::from_slice(&sent[0].body).unwrap();
        assert_eq!(body, json!({"contentType": "image/jpeg", "consentId": "c1"}));
        assert_eq!(sent[0].headers.get("X-Signed-Path").unwrap(), "/v1/documents");
    }

    #[tokio::test]
    async fn test_no_content_returns_acknowledgement_without_decoding() {
        let serializer = Arc::new(CountingSerializer {
            decodes: AtomicUsize::new(0),
        });
        let transport = FakeTransport::with(vec![Ok(RawResponse::new(204, Vec::new()))]);
        let executor = RequestExecutor::new(
            "https://api.lucidtech.ai/v1",
            Arc::new(SequenceSigner::default()),
            transport.clone(),
            serializer.clone(),
        );

        let value = executor
            .execute(RequestBuilder::post("/transitions/t1/executions/e1/heartbeats"))
            .await
            .unwrap();

        assert_eq!(value, json!({"message": "request executed successfully"}));
        assert_eq!(serializer.decodes.load(Ordering::SeqCst), 0);
        assert_eq!(transport.sent()[0].body, b"{}");
    }

    #[tokio::test]
    async fn test_throttle_follows_schedule_then_fails() {
        let harness = Harness::new(FakeTransport::repeating(throttled(), 5));

        let err = harness
            .executor
            .execute(RequestBuilder::get("/documents"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::RateLimit {
                scope: RateLimitScope::PerSecond,
                ..
            }
        ));
        assert_eq!(harness.transport.sent().len(), 5);
        assert_eq!(
            harness.slept(),
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }

    #[tokio::test]
    async fn test_throttle_recovers() {
        let harness = Harness::new(FakeTransport::with(vec![
            Ok(throttled()),
            Ok(throttled()),
            Ok(RawResponse::new(200, r#"{"ok": true}"#)),
        ]));

        let value = harness
            .executor
            .execute(RequestBuilder::get("/models"))
            .await
            .unwrap();
        assert_eq!(value, json!({"ok": true}));
        assert_eq!(
            harness.slept(),
            vec![Duration::from_millis(500), Duration::from_secs(1)]
        );
    }

    #[tokio::test]
    async fn test_monthly_limit_is_fatal() {
        let harness = Harness::new(FakeTransport::repeating(
            RawResponse::new(429, "Limit Exceeded"),
            3,
        ));

        let err = harness
            .executor
            .execute(RequestBuilder::get("/documents"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::RateLimit {
                scope: RateLimitScope::PerMonth,
                ..
            }
        ));
        assert_eq!(harness.transport.sent().len(), 1);
        assert!(harness.slept().is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_is_fatal() {
        let harness = Harness::new(FakeTransport::repeating(RawResponse::new(403, "Forbidden"), 3));

        let err = harness
            .executor
            .execute(RequestBuilder::get("/users"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth { .. }));
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_server_errors_are_bounded() {
        let harness = Harness::new(FakeTransport::repeating(RawResponse::new(500, "oops"), 10));

        let err = harness
            .executor
            .execute(RequestBuilder::get("/batches"))
            .await
            .unwrap_err();

        match err {
            Error::Request { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "oops");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(harness.transport.sent().len(), 4);
        assert_eq!(harness.slept(), vec![Duration::ZERO; 3]);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let harness = Harness::new(FakeTransport::repeating(RawResponse::new(404, "missing"), 3));

        let err = harness
            .executor
            .execute(RequestBuilder::get("/documents/nope"))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(404));
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_decode_error_is_fatal() {
        let harness = Harness::new(FakeTransport::repeating(RawResponse::new(200, "<html>"), 2));

        let err = harness
            .executor
            .execute(RequestBuilder::get("/models"))
            .await
            .unwrap_err();

        match err {
            Error::Decode { raw_body, .. } => assert_eq!(raw_body, "<html>"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_errors_follow_policy() {
        let harness = Harness::new(FakeTransport::with(vec![
            Err(Error::transport("connection reset")),
            Ok(RawResponse::new(200, "{}")),
        ]));
        let err = harness
            .executor
            .execute(RequestBuilder::get("/assets"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(harness.transport.sent().len(), 1);

        let harness = Harness::with_policy(
            FakeTransport::with(vec![
                Err(Error::transport("connection reset")),
                Ok(RawResponse::new(200, "{}")),
            ]),
            RetryPolicy::default().with_retry_transport_errors(true),
        );
        let value = harness
            .executor
            .execute(RequestBuilder::get("/assets"))
            .await
            .unwrap();
        assert_eq!(value, json!({}));
        assert_eq!(harness.transport.sent().len(), 2);
    }

    fn refused() -> Error {
        Error::Transport {
            message: "Failed to send request: connection refused".to_string(),
            source: Some(anyhow::anyhow!("tcp connect error: connection refused")),
        }
    }

    #[tokio::test]
    async fn test_transport_error_is_surfaced_unchanged() {
        let harness = Harness::new(FakeTransport::with(vec![Err(refused())]));

        let err = harness
            .executor
            .execute(RequestBuilder::get("/models"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Transport error: Failed to send request: connection refused"
        );
        let source = std::error::Error::source(&err).expect("source is kept");
        assert_eq!(source.to_string(), "tcp connect error: connection refused");
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_last_transport_error_is_surfaced_after_retries() {
        let harness = Harness::with_policy(
            FakeTransport::with((0..4).map(|_| Err(refused())).collect()),
            RetryPolicy::default().with_retry_transport_errors(true),
        );

        let err = harness
            .executor
            .execute(RequestBuilder::get("/models"))
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Transport error: Failed to send request: connection refused"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(harness.transport.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_each_attempt_is_signed_freshly() {
        let harness = Harness::new(FakeTransport::with(vec![
            Ok(RawResponse::new(502, "bad gateway")),
            Ok(throttled()),
            Ok(RawResponse::new(200, "{}")),
        ]));

        harness
            .executor
            .execute(RequestBuilder::get("/workflows"))
            .await
            .unwrap();

        assert_eq!(harness.signer.calls.load(Ordering::SeqCst), 3);
        let authorizations: Vec<String> = harness
            .transport
            .sent()
            .iter()
            .map(|r| r.headers.get("Authorization").cloned().unwrap())
            .collect();
        assert_eq!(
            authorizations,
            vec!["Bearer token-0", "Bearer token-1", "Bearer token-2"]
        );
    }

    #[tokio::test]
    async fn test_query_parameters_are_sent() {
        let harness = Harness::new(FakeTransport::with(vec![Ok(RawResponse::new(
            200,
            r#"{"assets": [], "nextToken": null}"#,
        ))]));

        harness
            .executor
            .execute(
                RequestBuilder::get("/assets")
                    .query("maxResults", 3)
                    .query("nextToken", "foo"),
            )
            .await
            .unwrap();

        let sent = harness.transport.sent();
        let pairs: Vec<(String, String)> = sent[0].url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("maxResults".to_string(), "3".to_string()),
                ("nextToken".to_string(), "foo".to_string())
            ]
        );
        assert!(sent[0].body.is_empty());
        assert_eq!(sent[0].headers.get("Authorization").unwrap(), "Bearer token-0");
    }

    #[tokio::test]
    async fn test_signing_failure_skips_send() {
        let transport = FakeTransport::with(vec![Ok(RawResponse::new(200, "{}"))]);
        let executor = RequestExecutor::new(
            "https://api.lucidtech.ai/v1",
            Arc::new(FailingSigner),
            transport.clone(),
            Arc::new(JsonSerializer),
        );

        let err = executor.execute(RequestBuilder::get("/assets")).await.unwrap_err();
        assert!(matches!(err, Error::Auth { .. }));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let harness = Harness::new(FakeTransport::with(vec![Ok(RawResponse::new(200, "{}"))]));
        let token = CancellationToken::new();
        token.cancel();

        let err = harness
            .executor
            .execute_with_cancel(RequestBuilder::get("/assets"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(harness.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_during_backoff() {
        let transport = FakeTransport::repeating(throttled(), 5);
        let executor = RequestExecutor::new(
            "https://api.lucidtech.ai/v1",
            Arc::new(SequenceSigner::default()),
            transport.clone(),
            Arc::new(JsonSerializer),
        )
        .with_sleeper(Arc::new(PendingSleeper));

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        let err = executor
            .execute_with_cancel(RequestBuilder::get("/assets"), &token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_non_transport_send_error_aborts() {
        let harness = Harness::new(FakeTransport::with(vec![
            Err(Error::configuration("bad header")),
            Ok(RawResponse::new(200, "{}")),
        ]));
        let err = harness
            .executor
            .execute(RequestBuilder::get("/assets"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert_eq!(harness.transport.sent().len(), 1);
    }

    #[test]
    fn test_header_map_skips_host() {
        let mut headers = Headers::new();
        headers.insert("Host".to_string(), "api.lucidtech.ai".to_string());
        headers.insert("X-Api-Key".to_string(), "k".to_string());
        let map = ReqwestTransport::header_map(&headers).unwrap();
        assert!(map.get("host").is_none());
        assert_eq!(map.get("x-api-key").unwrap(), "k");

        headers.insert("Bad Header".to_string(), "v".to_string());
        assert!(ReqwestTransport::header_map(&headers).is_err());
    }
}
