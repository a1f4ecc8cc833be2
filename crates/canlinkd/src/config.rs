//! Configuration file handling for canlinkd

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use canlink_driver::{ConfiguredDriverFactory, DriverConfig};
use canlink_session::StreamConfig;
use serde::{Deserialize, Serialize};

/// Default listen port
pub const DEFAULT_PORT: u16 = 18090;

/// Daemon configuration (TOML)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub stream: StreamSettings,
    /// Driver used for any channel without an override
    pub driver: DriverConfig,
    /// Per-channel driver overrides
    pub channels: HashMap<String, DriverConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    /// Subscription poll period in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
        }
    }
}

impl Config {
    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.stream.poll_interval_ms == 0 {
            anyhow::bail!("stream.poll_interval_ms must be greater than zero");
        }
        Ok(config)
    }

    /// Driver factory for this configuration
    pub fn driver_factory(&self) -> ConfiguredDriverFactory {
        self.channels.iter().fold(
            ConfiguredDriverFactory::new(self.driver.clone()),
            |factory, (channel, config)| factory.with_channel(channel.clone(), config.clone()),
        )
    }

    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig::with_poll_interval(Duration::from_millis(self.stream.poll_interval_ms))
    }
}
