//! Driver configuration
//!
//! Deserialized from the daemon's TOML file; each variant selects one
//! transport and carries its settings.

use std::path::PathBuf;

use canlink_core::Frame;
use serde::{Deserialize, Serialize};

/// Transport selection, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DriverConfig {
    /// In-memory live transport for development and tests
    Mock(MockConfig),
    /// Finite, file-backed frame source
    Replay(ReplayConfig),
    /// SocketCAN raw socket (Linux only)
    SocketCan(SocketCanConfig),
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// Mock transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
    /// Frames queued for reading when a session opens
    #[serde(default = "default_mock_frames")]
    pub frames: Vec<Frame>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            frames: default_mock_frames(),
        }
    }
}

fn default_mock_frames() -> Vec<Frame> {
    vec![
        Frame::new(0x123, vec![9, 10, 11, 12]),
        Frame::new(0x124, vec![13, 14, 15, 16]),
    ]
}

/// Replay transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// JSON frame file read in order, once per session
    pub path: PathBuf,
    /// Append every written frame here as one JSON line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_path: Option<PathBuf>,
}

/// SocketCAN configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketCanConfig {
    /// CAN interface name (e.g., "can0"); defaults to the session's channel name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// Nominal bitrate; the interface itself is configured out of band
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
}

impl Default for SocketCanConfig {
    fn default() -> Self {
        Self {
            interface: None,
            bitrate: default_bitrate(),
        }
    }
}

fn default_bitrate() -> u32 {
    500000
}
