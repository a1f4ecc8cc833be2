//! canlink-driver - CAN transport drivers
//!
//! This crate provides the concrete [`Driver`] implementations:
//! - [`MockDriver`] - in-memory live transport for development and tests
//! - [`ReplayDriver`] - finite frame sequence loaded from a JSON file
//! - `SocketCanDriver` - raw SocketCAN socket (Linux, `socketcan` feature)
//!
//! # Example
//!
//! ```ignore
//! use canlink_driver::{create_driver, DriverConfig};
//!
//! let config = DriverConfig::Mock(Default::default());
//! let driver = create_driver(&config, "can0").await?;
//! driver.write_frame(&Frame::new(0x123, vec![1, 2, 3, 4])).await?;
//! ```

pub mod config;
pub mod frame_file;
pub mod mock;
pub mod replay;

#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub mod socketcan;

pub use config::{DriverConfig, MockConfig, ReplayConfig, SocketCanConfig};
pub use frame_file::{load_frames, parse_frames, FrameFileError};
pub use mock::MockDriver;
pub use replay::ReplayDriver;

use std::collections::HashMap;

use async_trait::async_trait;
use canlink_core::{Driver, DriverError, DriverFactory, DriverResult};

/// Create a driver for `channel` based on configuration
pub async fn create_driver(config: &DriverConfig, channel: &str) -> DriverResult<Box<dyn Driver>> {
    match config {
        DriverConfig::Mock(cfg) => Ok(Box::new(MockDriver::new(cfg))),
        DriverConfig::Replay(cfg) => {
            let driver = ReplayDriver::from_config(cfg)
                .map_err(|e| DriverError::InvalidConfig(e.to_string()))?;
            Ok(Box::new(driver))
        }
        #[cfg(all(target_os = "linux", feature = "socketcan"))]
        DriverConfig::SocketCan(cfg) => {
            let driver = socketcan::SocketCanDriver::open(cfg, channel)?;
            Ok(Box::new(driver))
        }
        #[cfg(not(all(target_os = "linux", feature = "socketcan")))]
        DriverConfig::SocketCan(_) => Err(DriverError::Unsupported(format!(
            "SocketCAN on channel '{}' requires Linux and the 'socketcan' feature",
            channel
        ))),
    }
}

/// Driver factory backed by configuration
///
/// Channels with an explicit override get their own config; every other
/// channel uses the default.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredDriverFactory {
    default: DriverConfig,
    channels: HashMap<String, DriverConfig>,
}

impl ConfiguredDriverFactory {
    pub fn new(default: DriverConfig) -> Self {
        Self {
            default,
            channels: HashMap::new(),
        }
    }

    /// Override the driver config for one channel
    pub fn with_channel(mut self, channel: impl Into<String>, config: DriverConfig) -> Self {
        self.channels.insert(channel.into(), config);
        self
    }

    /// Config that applies to `channel`
    pub fn config_for(&self, channel: &str) -> &DriverConfig {
        self.channels.get(channel).unwrap_or(&self.default)
    }
}

#[async_trait]
impl DriverFactory for ConfiguredDriverFactory {
    async fn create(&self, channel: &str) -> DriverResult<Box<dyn Driver>> {
        let driver = create_driver(self.config_for(channel), channel).await?;
        tracing::debug!(channel, driver = driver.kind(), "Created driver");
        Ok(driver)
    }
}
