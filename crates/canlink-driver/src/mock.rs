//! Mock driver for development and testing

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use canlink_core::{Driver, DriverError, DriverResult, Frame};
use parking_lot::Mutex;

use crate::config::MockConfig;

/// In-memory live transport
///
/// Reads pop a queue of pending frames and fail with `NoFrameAvailable` while
/// it is empty; the queue can be refilled at any time with [`inject`], so the
/// source is never exhausted. Writes are recorded and logged.
///
/// [`inject`]: MockDriver::inject
pub struct MockDriver {
    latency: Duration,
    connected: AtomicBool,
    pending: Mutex<VecDeque<Frame>>,
    sent: Mutex<Vec<Frame>>,
}

impl MockDriver {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            latency: Duration::from_millis(config.latency_ms),
            connected: AtomicBool::new(true),
            pending: Mutex::new(config.frames.iter().cloned().collect()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Mock driver with no latency and the given frames queued for reading
    pub fn with_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self::new(&MockConfig {
            latency_ms: 0,
            frames: frames.into_iter().collect(),
        })
    }

    /// Queue a frame for reading (simulates traffic arriving on the bus)
    pub fn inject(&self, frame: Frame) {
        self.pending.lock().push_back(frame);
    }

    /// Frames written so far, in write order
    pub fn sent_frames(&self) -> Vec<Frame> {
        self.sent.lock().clone()
    }

    /// Number of frames still queued for reading
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Set connection state
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    async fn simulate(&self) -> DriverResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(DriverError::ConnectionClosed);
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(())
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new(&MockConfig::default())
    }
}

#[async_trait]
impl Driver for MockDriver {
    async fn write_frame(&self, frame: &Frame) -> DriverResult<()> {
        self.simulate().await?;
        tracing::debug!(%frame, "Mock driver: sent frame");
        self.sent.lock().push(frame.clone());
        Ok(())
    }

    async fn read_frame(&self) -> DriverResult<Frame> {
        self.simulate().await?;
        let frame = self
            .pending
            .lock()
            .pop_front()
            .ok_or(DriverError::NoFrameAvailable)?;
        tracing::debug!(%frame, "Mock driver: received frame");
        Ok(frame)
    }

    fn kind(&self) -> &'static str {
        "mock"
    }
}
