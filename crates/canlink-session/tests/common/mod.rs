#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use canlink_core::{Driver, DriverFactory, DriverResult};
use canlink_driver::MockDriver;
use parking_lot::Mutex;

/// Factory that builds mock drivers and keeps a reference to each, so tests
/// can inspect what reached the write path
#[derive(Default)]
pub struct RecordingFactory {
    created: Mutex<Vec<(String, Arc<MockDriver>)>>,
}

impl RecordingFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Driver created for the n-th connect
    pub fn driver(&self, n: usize) -> Arc<MockDriver> {
        self.created.lock()[n].1.clone()
    }

    pub fn created(&self) -> usize {
        self.created.lock().len()
    }
}

#[async_trait]
impl DriverFactory for RecordingFactory {
    async fn create(&self, channel: &str) -> DriverResult<Box<dyn Driver>> {
        let driver = Arc::new(MockDriver::with_frames([]));
        self.created
            .lock()
            .push((channel.to_string(), driver.clone()));
        Ok(Box::new(driver))
    }
}
