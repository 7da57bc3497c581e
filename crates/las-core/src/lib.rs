//! LAS Core - Resilient, authenticated request execution for the Lucidtech AI Services API
//!
//! Every endpoint call funnels through one execution layer that signs the
//! request, sends it, classifies the response and retries where that is safe.
//!
//! # Main Components
//!
//! - **Credentials**: loading keys and endpoints from the environment or a credentials file
//! - **Credential providers**: cached OAuth2 access tokens with single-flight refresh
//! - **Request signing**: bearer tokens or HMAC message signatures, fresh per attempt
//! - **Classification**: mapping status and body to typed outcomes
//! - **Retry policy**: fixed throttle backoff plus bounded transient retries
//! - **Endpoints**: typed methods for documents, predictions, transitions, workflows and more
//!
//! # Example
//!
//! ```no_run
//! use las_core::{Client, Result};
//! use las_core::endpoints::Page;
//!
//! async fn example() -> Result<()> {
//!     let client = Client::from_default_credentials()?;
//!     let models = client.list_models(&Page::first(10)).await?;
//!     println!("{}", models);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod serializer;
pub mod time;

#[cfg(feature = "blocking")]
pub mod blocking;

// Re-export main types for convenience
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use http::{
    ClassifiedOutcome, CredentialProvider, Method, RateLimitScope, RequestBuilder, RequestSigner,
    RetryPolicy, SigningScheme, Transport,
};
pub use serializer::{JsonSerializer, Serializer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
