//! Frame file loading
//!
//! A frame file is a JSON array of `{ "id": <u32>, "data": <bytes> }`
//! records, where `data` is an array of byte values, a base64 string or a
//! `0x`-prefixed hex string. Records
//! are returned in file order. No payload length limit is applied here.

use std::path::{Path, PathBuf};

use canlink_core::Frame;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameFileError {
    #[error("Failed to read frame file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse frame file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load every frame from a JSON frame file
pub fn load_frames(path: impl AsRef<Path>) -> Result<Vec<Frame>, FrameFileError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| FrameFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let frames = parse_frames(&content).map_err(|source| FrameFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), count = frames.len(), "Loaded frame file");
    Ok(frames)
}

/// Parse frames from JSON text
pub fn parse_frames(content: &str) -> Result<Vec<Frame>, serde_json::Error> {
    serde_json::from_str(content)
}
