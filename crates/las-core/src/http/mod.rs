//! HTTP request execution for the LAS API
//!
//! This module provides:
//! - Request assembly from endpoint parameters
//! - Credential providers and OAuth2 token refresh
//! - Bearer and message-signature request signing
//! - Response classification into typed outcomes
//! - Bounded retry with a fixed throttle backoff schedule

pub mod auth;
pub mod builder;
pub mod error;
pub mod executor;
pub mod retry;
pub mod signer;
pub mod timeout;

pub use auth::{
    AccessToken, ClientCredentialsProvider, CredentialProvider, KeyMaterial, OAuthTokenIssuer,
    StaticTokenProvider, TokenIssuer,
};
pub use builder::{PreparedRequest, RequestBuilder};
pub use error::{acknowledgement, ClassifiedOutcome, ErrorClassifier, RateLimitScope, RawResponse};
pub use executor::{OutgoingRequest, ReqwestTransport, RequestExecutor, Transport};
pub use retry::{decide, Attempts, RetryDecision, RetryHandler, RetryPolicy, RetryReason};
pub use signer::{
    create_signer, BearerSigner, Headers, MessageSigner, RequestSigner, SigningScheme,
};
pub use timeout::TimeoutConfig;

// Re-export commonly used types
pub use reqwest::Method;
