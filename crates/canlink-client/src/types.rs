//! Request and response types for the canlink HTTP API

use canlink_core::Frame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ConnectRequest {
    pub channel: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectResponse {
    pub status: String,
    pub id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisconnectRequest {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisconnectResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendRequest {
    /// Session identifier
    pub id: String,
    pub frame: Frame,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub message: String,
}

/// Session as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionInfo {
    pub id: String,
    pub channel: String,
    pub created_at: DateTime<Utc>,
    /// "active" or "inactive"
    pub status: String,
    #[serde(default)]
    pub driver: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionList {
    pub items: Vec<SessionInfo>,
}

/// Error body returned by the server
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub message: String,
}
