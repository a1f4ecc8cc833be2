//! Error types for canlink client operations

use thiserror::Error;

use crate::streaming::StreamError;

/// Result type alias for canlink client operations
pub type Result<T> = std::result::Result<T, CanLinkClientError>;

/// Errors that can occur during canlink client operations
#[derive(Error, Debug)]
pub enum CanLinkClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Server returned an error response
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Session does not exist on the server
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Request rejected as malformed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Bus transport unavailable on the server side
    #[error("Bus unavailable: {0}")]
    Unavailable(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Streaming error
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),
}

impl CanLinkClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::ServerError {
            status,
            message: message.into(),
        }
    }

    pub fn is_session_not_found(&self) -> bool {
        matches!(self, CanLinkClientError::SessionNotFound(_))
            || matches!(self, CanLinkClientError::Stream(StreamError::Server { status: 404, .. }))
    }
}
