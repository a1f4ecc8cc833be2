//! Session-level errors

use canlink_core::DriverError;
use thiserror::Error;

/// Errors from registry and subscription operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No active session with this identifier (never existed or disconnected)
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Failure reported by the session's driver, passed through unchanged
    #[error(transparent)]
    Driver(#[from] DriverError),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}
