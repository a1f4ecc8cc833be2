//! Subscription error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    /// Transport failure while opening or reading the event stream
    #[error("Stream connection failed: {0}")]
    Connection(#[from] reqwest::Error),

    /// Event data that is not a frame event
    #[error("Malformed stream event: {0}")]
    Parse(String),

    /// Subscription rejected with a non-success status
    #[error("Subscription rejected ({status}): {message}")]
    Server { status: u16, message: String },
}

pub type StreamResult<T> = std::result::Result<T, StreamError>;
