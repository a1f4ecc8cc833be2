//! Streaming event payload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::frame::{CanId, Frame};

/// One frame delivered to a subscriber
///
/// Each event is self-contained; the transport framing (SSE, websocket, ...)
/// is up to the serving layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameEvent {
    pub session_id: String,
    /// Identifier the subscription filters on
    pub can_id: CanId,
    pub frame: Frame,
    /// When the frame was observed on the bus
    pub timestamp: DateTime<Utc>,
}

impl FrameEvent {
    pub fn new(session_id: impl Into<String>, can_id: CanId, frame: Frame) -> Self {
        Self {
            session_id: session_id.into(),
            can_id,
            frame,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = FrameEvent::new("session_1", 0x123, Frame::new(0x123, vec![1, 2]));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["session_id"], "session_1");
        assert_eq!(json["can_id"], 291);
        assert_eq!(json["frame"]["id"], 291);
        assert_eq!(json["frame"]["data"], serde_json::json!([1, 2]));
        assert!(json["timestamp"].is_string());

        let back: FrameEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
