//! Frame transmission handler

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use canlink_core::Frame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Session identifier
    pub id: String,
    pub frame: Frame,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// POST /api/can/send
/// Transmit one frame on a session's bus
pub async fn send_frame(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<SendResponse>, ApiError> {
    let Json(request) = payload?;

    state.registry().send(&request.id, &request.frame).await?;

    Ok(Json(SendResponse {
        status: "sent".to_string(),
        timestamp: Utc::now(),
        message: format!("Frame sent: ID=0x{:X}", request.frame.id()),
    }))
}
