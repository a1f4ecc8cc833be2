//! Incremental `text/event-stream` decoder
//!
//! Bytes arrive in arbitrary chunks; complete lines are folded into events
//! and every event's `data` is decoded as one JSON [`FrameEvent`].

use bytes::Bytes;
use canlink_core::FrameEvent;
use tracing::trace;

use super::types::{StreamError, StreamResult};

#[derive(Debug, Default)]
pub struct SseParser {
    /// Bytes after the last complete line
    partial: Vec<u8>,
    /// `data:` lines of the event being assembled
    data: Vec<String>,
    last_id: Option<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last `id:` field seen on the stream
    pub fn last_id(&self) -> Option<&str> {
        self.last_id.as_deref()
    }

    /// Append a chunk and return every event it completes
    pub fn feed(&mut self, chunk: Bytes) -> Vec<StreamResult<FrameEvent>> {
        self.partial.extend_from_slice(&chunk);

        let mut events = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.partial[consumed..].iter().position(|&b| b == b'\n') {
            let end = consumed + offset;
            let line = self.partial[consumed..end].to_vec();
            consumed = end + 1;

            let line = line.strip_suffix(b"\r").unwrap_or(&line);
            if let Some(event) = self.line(line) {
                events.push(event);
            }
        }
        self.partial.drain(..consumed);

        events
    }

    fn line(&mut self, line: &[u8]) -> Option<StreamResult<FrameEvent>> {
        if line.is_empty() {
            return self.finish_event();
        }
        // Comments carry keep-alives
        if line.first() == Some(&b':') {
            return None;
        }

        let Ok(text) = std::str::from_utf8(line) else {
            return Some(Err(StreamError::Parse("Invalid UTF-8 in SSE line".into())));
        };
        let (field, value) = text
            .split_once(':')
            .map(|(f, v)| (f, v.strip_prefix(' ').unwrap_or(v)))
            .unwrap_or((text, ""));

        match field {
            "data" => self.data.push(value.to_string()),
            "id" => self.last_id = Some(value.to_string()),
            other => trace!(field = other, "Ignoring SSE field"),
        }
        None
    }

    fn finish_event(&mut self) -> Option<StreamResult<FrameEvent>> {
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");

        Some(serde_json::from_str(&data).map_err(|e| {
            let preview: String = data.chars().take(100).collect();
            StreamError::Parse(format!("Bad frame event: {} (data: {})", e, preview))
        }))
    }
}
