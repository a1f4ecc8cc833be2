//! Driver-level error types

use thiserror::Error;

/// Result type for driver and bus operations
pub type DriverResult<T> = Result<T, DriverError>;

/// Errors reported by a [`Driver`](crate::Driver)
///
/// Neither the bus nor the session registry retries on any of these; the
/// caller decides the retry policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Nothing to read right now. For a finite source this also marks the
    /// end of the sequence (see [`Driver::is_exhausted`](crate::Driver::is_exhausted)).
    #[error("No frame available")]
    NoFrameAvailable,

    /// I/O or device failure in the transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport has been closed or the device went away
    #[error("Connection closed")]
    ConnectionClosed,

    /// The transport cannot carry this frame (oversized payload, bad identifier)
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transport not compiled in or not available on this platform
    #[error("Driver not supported: {0}")]
    Unsupported(String),
}

impl DriverError {
    /// Whether the error only means "try again later"
    pub fn is_no_frame(&self) -> bool {
        matches!(self, DriverError::NoFrameAvailable)
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::WouldBlock => DriverError::NoFrameAvailable,
            std::io::ErrorKind::NotConnected | std::io::ErrorKind::BrokenPipe => {
                DriverError::ConnectionClosed
            }
            _ => DriverError::Transport(err.to_string()),
        }
    }
}
