//! Driver capability trait and factory

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::DriverResult;
use crate::frame::Frame;

/// Transport-agnostic interface for raw CAN frame I/O
///
/// This trait abstracts the underlying transport (SocketCAN, file replay,
/// in-memory mock, ...) so the bus and session layers never depend on a
/// concrete variant.
///
/// Both calls take `&self`: a driver that is not safe for concurrent use must
/// serialize internally. Futures returned by either call may be dropped at any
/// await point to cancel the operation.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Transmit one frame
    async fn write_frame(&self, frame: &Frame) -> DriverResult<()>;

    /// Obtain the next available frame
    ///
    /// Fails with [`DriverError::NoFrameAvailable`](crate::DriverError::NoFrameAvailable)
    /// when nothing can be read right now.
    async fn read_frame(&self) -> DriverResult<Frame>;

    /// Whether a finite source has been fully consumed
    ///
    /// Once this returns `true` no further read will ever succeed. Live
    /// transports keep the default.
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Short transport name for logging ("mock", "replay", "socketcan", ...)
    fn kind(&self) -> &'static str;
}

#[async_trait]
impl<D: Driver + ?Sized> Driver for Arc<D> {
    async fn write_frame(&self, frame: &Frame) -> DriverResult<()> {
        (**self).write_frame(frame).await
    }

    async fn read_frame(&self) -> DriverResult<Frame> {
        (**self).read_frame().await
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

/// Produces a fresh driver for a logical channel name
///
/// Every call must return a new instance; drivers are never shared between
/// sessions.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn create(&self, channel: &str) -> DriverResult<Box<dyn Driver>>;
}
