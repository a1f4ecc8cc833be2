//! Application state for the canlink API

use std::sync::Arc;

use canlink_session::{SessionRegistry, StreamConfig};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    registry: Arc<SessionRegistry>,
    stream_config: StreamConfig,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            stream_config: StreamConfig::default(),
        }
    }

    /// Use a different streaming configuration for subscriptions
    pub fn with_stream_config(mut self, stream_config: StreamConfig) -> Self {
        self.stream_config = stream_config;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn stream_config(&self) -> StreamConfig {
        self.stream_config
    }
}
