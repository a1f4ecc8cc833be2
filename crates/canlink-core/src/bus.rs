//! Policy-free bus facade over a single driver

use std::fmt;

use crate::driver::Driver;
use crate::error::DriverResult;
use crate::frame::Frame;

/// A CAN bus backed by exactly one [`Driver`]
///
/// `send` and `receive` pass straight through to the driver and return its
/// result unchanged. The bus adds no queuing, deduplication or ordering of its
/// own, and does not serialize concurrent calls.
pub struct Bus {
    driver: Box<dyn Driver>,
}

impl Bus {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self { driver }
    }

    /// Transmit a frame through the driver
    pub async fn send(&self, frame: &Frame) -> DriverResult<()> {
        self.driver.write_frame(frame).await
    }

    /// Read the next frame from the driver
    pub async fn receive(&self) -> DriverResult<Frame> {
        self.driver.read_frame().await
    }

    /// Whether the underlying source is finite and fully consumed
    pub fn is_exhausted(&self) -> bool {
        self.driver.is_exhausted()
    }

    pub fn driver_kind(&self) -> &'static str {
        self.driver.kind()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("driver", &self.driver.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::DriverError;

    #[derive(Default)]
    struct RecordingDriver {
        written: Mutex<Vec<Frame>>,
        pending: Mutex<VecDeque<Frame>>,
    }

    #[async_trait]
    impl Driver for RecordingDriver {
        async fn write_frame(&self, frame: &Frame) -> DriverResult<()> {
            if frame.len() > 8 {
                return Err(DriverError::InvalidFrame("too long".into()));
            }
            self.written.lock().push(frame.clone());
            Ok(())
        }

        async fn read_frame(&self) -> DriverResult<Frame> {
            self.pending
                .lock()
                .pop_front()
                .ok_or(DriverError::NoFrameAvailable)
        }

        fn kind(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_send_forwards_exact_frame() {
        let driver = Arc::new(RecordingDriver::default());
        let bus = Bus::new(Box::new(driver.clone()));

        bus.send(&Frame::new(0x123, vec![1, 2, 3, 4])).await.unwrap();
        bus.send(&Frame::new(0x124, vec![])).await.unwrap();

        assert_eq!(
            *driver.written.lock(),
            vec![Frame::new(0x123, vec![1, 2, 3, 4]), Frame::new(0x124, vec![])]
        );
    }

    #[tokio::test]
    async fn test_driver_errors_pass_through_unchanged() {
        let driver = Arc::new(RecordingDriver::default());
        let bus = Bus::new(Box::new(driver.clone()));

        let err = bus.send(&Frame::new(1, vec![0; 9])).await.unwrap_err();
        assert_eq!(err, DriverError::InvalidFrame("too long".into()));
        assert_eq!(bus.receive().await, Err(DriverError::NoFrameAvailable));
    }

    #[tokio::test]
    async fn test_receive_preserves_driver_order() {
        let driver = Arc::new(RecordingDriver::default());
        driver.pending.lock().extend([
            Frame::new(1, vec![1]),
            Frame::new(2, vec![2]),
            Frame::new(1, vec![3]),
        ]);
        let bus = Bus::new(Box::new(driver));

        assert_eq!(bus.receive().await.unwrap(), Frame::new(1, vec![1]));
        assert_eq!(bus.receive().await.unwrap(), Frame::new(2, vec![2]));
        assert_eq!(bus.receive().await.unwrap(), Frame::new(1, vec![3]));
        assert!(!bus.is_exhausted());
        assert_eq!(bus.driver_kind(), "recording");
    }
}
