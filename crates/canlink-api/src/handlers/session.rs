//! Session lifecycle handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use canlink_session::SessionInfo;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub channel: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub status: String,
    pub id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DisconnectRequest {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub items: Vec<SessionInfo>,
}

/// POST /api/can/connect
/// Open a session on a channel
pub async fn connect(
    State(state): State<AppState>,
    payload: Result<Json<ConnectRequest>, JsonRejection>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let Json(request) = payload?;
    if request.channel.trim().is_empty() {
        return Err(ApiError::BadRequest("channel must not be empty".to_string()));
    }

    let id = state.registry().connect(&request.channel).await?;

    Ok(Json(ConnectResponse {
        status: "connected".to_string(),
        id: id.to_string(),
        message: format!("Connected to channel {}", request.channel),
    }))
}

/// POST /api/can/disconnect
/// Close a session; unknown ids are acknowledged as well
pub async fn disconnect(
    State(state): State<AppState>,
    payload: Result<Json<DisconnectRequest>, JsonRejection>,
) -> Result<Json<DisconnectResponse>, ApiError> {
    let Json(request) = payload?;
    if request.id.is_empty() {
        return Err(ApiError::BadRequest("id must not be empty".to_string()));
    }

    state.registry().disconnect(&request.id);

    Ok(Json(DisconnectResponse {
        status: "disconnected".to_string(),
        message: format!("Session {} disconnected", request.id),
    }))
}

/// GET /api/can/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        items: state.registry().list(),
    })
}

/// GET /api/can/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionInfo>, ApiError> {
    state
        .registry()
        .get(&session_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))
}
