//! Frame subscription over SSE (Server-Sent Events)

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use canlink_core::parse_can_id;
use futures::StreamExt;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters for a subscription
///
/// `canId` accepts decimal or `0x`-prefixed hex.
#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    pub id: Option<String>,
    #[serde(rename = "canId")]
    pub can_id: Option<String>,
}

/// GET /api/can/subscribe?id=<session>&canId=<id>
/// Stream frames with the given identifier until the subscription closes
///
/// Each event carries one JSON `FrameEvent`; the SSE `id:` field is a
/// per-stream sequence number starting at 1.
pub async fn subscribe(
    State(state): State<AppState>,
    Query(query): Query<SubscribeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (session_id, can_id) = match (query.id, query.can_id) {
        (Some(id), Some(can_id)) if !id.is_empty() && !can_id.is_empty() => (id, can_id),
        _ => {
            return Err(ApiError::BadRequest(
                "missing required parameters: id and canId".to_string(),
            ))
        }
    };
    let can_id = parse_can_id(&can_id).map_err(ApiError::BadRequest)?;

    let subscription = state
        .registry()
        .subscribe(&session_id, can_id, state.stream_config())?;

    let stream = subscription
        .into_stream()
        .enumerate()
        .map(|(index, event)| {
            let data = serde_json::to_string(&event).unwrap_or_default();
            Ok::<_, Infallible>(Event::default().id((index + 1).to_string()).data(data))
        });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
