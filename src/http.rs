//! HTTP client abstraction for testability.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{trace, warn};

/// Request timeout for image and feed fetches.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent sent with every request.
const USER_AGENT: &str = concat!("forkful/", env!("CARGO_PKG_VERSION"));

/// HTTP transport errors.
///
/// `Clone` so a single failure can be fanned out to every coalesced
/// waiter of a shared fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// The request could not be sent or the response body not read
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

/// Trait for asynchronous HTTP GET operations.
///
/// This abstraction allows dependency injection and easier testing by
/// enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Perform an async HTTP GET request, returning the response body.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, HttpError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with default configuration.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        trace!(url, "HTTP GET request starting");

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, error = %e, "HTTP request failed");
            HttpError::Transport(format!("Request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "HTTP error status");
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => Err(HttpError::Transport(format!("Failed to read response: {e}"))),
        }
    }
}
