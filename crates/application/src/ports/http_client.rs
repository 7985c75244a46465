//! HTTP Client port

use async_trait::async_trait;
use thiserror::Error;

use apiary_domain::request::RequestSpec;
use apiary_domain::response::ResponseSpec;

/// Errors produced by an HTTP client adapter.
///
/// Transport-level variants are recovered into a status-0 response
/// record by the caller; the remaining variants surface as rejected
/// operations.
#[derive(Debug, Clone, Error)]
pub enum HttpClientError {
    /// The URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request exceeded its timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// DNS resolution failed.
    #[error("DNS resolution failed for {host}")]
    Dns {
        /// The host that could not be resolved.
        host: String,
    },

    /// The server refused the connection.
    #[error("connection refused by {host}")]
    ConnectionRefused {
        /// The host that refused.
        host: String,
    },

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Any other client failure.
    #[error("{0}")]
    Other(String),
}

impl HttpClientError {
    /// Returns true for failures that occurred at the transport level.
    ///
    /// Transport failures are converted into `status = 0` response
    /// records instead of being propagated.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::Dns { .. }
                | Self::ConnectionRefused { .. }
                | Self::ConnectionFailed(_)
                | Self::Other(_)
        )
    }
}

/// Port for executing HTTP requests.
///
/// This trait abstracts the HTTP client implementation, allowing the
/// application layer to be independent of specific HTTP libraries.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes a resolved request and returns the normalized response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails due to network issues,
    /// timeout, or an invalid URL.
    async fn execute(&self, request: &RequestSpec) -> Result<ResponseSpec, HttpClientError>;
}
