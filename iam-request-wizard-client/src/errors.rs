//! Client error types

use thiserror::Error;

/// Result type alias for operations that can fail with `ClientError`
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors from talking to the review backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level HTTP failures
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with an error status payload
    #[error("Backend rejected the request: {message}")]
    Backend {
        /// The backend's message payload, surfaced verbatim to the user
        message: String,
    },

    /// Mutating request attempted without a CSRF token
    #[error("No CSRF token set; read the '_xsrf' cookie before submitting")]
    MissingCsrfToken,

    /// Base URL or endpoint path could not be parsed
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Response body did not match the expected shape
    #[error("Unexpected response from {endpoint}: {message}")]
    UnexpectedResponse {
        /// Endpoint path that produced the response
        endpoint: String,
        /// Detailed error message
        message: String,
    },
}

impl ClientError {
    /// Create a backend rejection error
    pub(crate) fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create an unexpected-response error
    pub(crate) fn unexpected_response(
        endpoint: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UnexpectedResponse {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}
