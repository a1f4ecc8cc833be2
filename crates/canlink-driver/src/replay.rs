//! File-backed replay driver

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use canlink_core::{Driver, DriverError, DriverResult, Frame};
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;

use crate::config::ReplayConfig;
use crate::frame_file::{load_frames, FrameFileError};

/// Replays a finite, pre-ordered frame sequence
///
/// `read_frame` hands out the frames in order, one per call, and fails with
/// `NoFrameAvailable` once the sequence is used up; it never wraps around.
/// Written frames are kept in an in-memory audit log and, when an audit path
/// is configured, appended to that file as JSON lines.
pub struct ReplayDriver {
    frames: Vec<Frame>,
    cursor: Mutex<usize>,
    audit: Mutex<Vec<Frame>>,
    audit_path: Option<PathBuf>,
}

impl ReplayDriver {
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            frames,
            cursor: Mutex::new(0),
            audit: Mutex::new(Vec::new()),
            audit_path: None,
        }
    }

    /// Load the replay sequence from a frame file
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FrameFileError> {
        Ok(Self::from_frames(load_frames(path)?))
    }

    pub fn from_config(config: &ReplayConfig) -> Result<Self, FrameFileError> {
        let mut driver = Self::open(&config.path)?;
        driver.audit_path = config.audit_path.clone();
        Ok(driver)
    }

    /// Also append written frames to this file
    pub fn with_audit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_path = Some(path.into());
        self
    }

    /// Frames not yet read
    pub fn remaining(&self) -> usize {
        self.frames.len() - *self.cursor.lock()
    }

    /// Frames written so far, in write order
    pub fn recorded(&self) -> Vec<Frame> {
        self.audit.lock().clone()
    }

    async fn append_audit(&self, path: &Path, frame: &Frame) -> DriverResult<()> {
        let mut line = serde_json::to_vec(frame)
            .map_err(|e| DriverError::Transport(format!("Failed to encode frame: {}", e)))?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                DriverError::Transport(format!("Audit file {}: {}", path.display(), e))
            })?;
        let io_err = |e: std::io::Error| {
            DriverError::Transport(format!("Audit file {}: {}", path.display(), e))
        };
        file.write_all(&line).await.map_err(io_err)?;
        // tokio hands the write to a blocking thread; flush waits for it
        file.flush().await.map_err(io_err)?;
        Ok(())
    }
}

#[async_trait]
impl Driver for ReplayDriver {
    async fn write_frame(&self, frame: &Frame) -> DriverResult<()> {
        if let Some(path) = &self.audit_path {
            self.append_audit(path, frame).await?;
        }
        tracing::debug!(%frame, "Replay driver: recorded frame");
        self.audit.lock().push(frame.clone());
        Ok(())
    }

    async fn read_frame(&self) -> DriverResult<Frame> {
        let frame = {
            let mut cursor = self.cursor.lock();
            let frame = self
                .frames
                .get(*cursor)
                .cloned()
                .ok_or(DriverError::NoFrameAvailable)?;
            *cursor += 1;
            frame
        };
        tracing::debug!(%frame, "Replay driver: replayed frame");
        Ok(frame)
    }

    fn is_exhausted(&self) -> bool {
        *self.cursor.lock() >= self.frames.len()
    }

    fn kind(&self) -> &'static str {
        "replay"
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_replays_in_order_then_exhausts() {
        let driver = ReplayDriver::from_frames(vec![
            Frame::new(0x123, vec![1]),
            Frame::new(0x123, vec![2]),
        ]);
        assert!(!driver.is_exhausted());
        assert_eq!(driver.remaining(), 2);

        assert_eq!(driver.read_frame().await.unwrap(), Frame::new(0x123, vec![1]));
        assert_eq!(driver.read_frame().await.unwrap(), Frame::new(0x123, vec![2]));
        assert!(driver.is_exhausted());

        // Never wraps around
        assert_eq!(driver.read_frame().await, Err(DriverError::NoFrameAvailable));
        assert_eq!(driver.read_frame().await, Err(DriverError::NoFrameAvailable));
        assert_eq!(driver.remaining(), 0);
    }

    #[tokio::test]
    async fn test_empty_sequence_is_exhausted() {
        let driver = ReplayDriver::from_frames(vec![]);
        assert!(driver.is_exhausted());
        assert!(driver.read_frame().await.unwrap_err().is_no_frame());
    }

    #[tokio::test]
    async fn test_open_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"id":1,"data":[1]}},{{"id":2,"data":[2]}}]"#).unwrap();

        let driver = ReplayDriver::open(file.path()).unwrap();
        assert_eq!(driver.read_frame().await.unwrap().id(), 1);
        assert_eq!(driver.read_frame().await.unwrap().id(), 2);
        assert!(driver.is_exhausted());
    }

    #[tokio::test]
    async fn test_write_records_and_appends_audit_file() {
        let dir = tempfile::tempdir().unwrap();
        let audit = dir.path().join("sent.jsonl");
        let driver = ReplayDriver::from_frames(vec![]).with_audit_path(&audit);

        driver.write_frame(&Frame::new(0x123, vec![1, 2])).await.unwrap();
        driver.write_frame(&Frame::new(0x124, vec![3])).await.unwrap();

        assert_eq!(
            driver.recorded(),
            vec![Frame::new(0x123, vec![1, 2]), Frame::new(0x124, vec![3])]
        );
        let content = std::fs::read_to_string(&audit).unwrap();
        let lines: Vec<Frame> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines, driver.recorded());
    }

    #[tokio::test]
    async fn test_audit_line_on_disk_when_write_returns() {
        let dir = tempfile::tempdir().unwrap();
        let audit = dir.path().join("sent.jsonl");
        let driver = ReplayDriver::from_frames(vec![]).with_audit_path(&audit);

        for i in 0..50u32 {
            driver.write_frame(&Frame::new(i, vec![i as u8])).await.unwrap();

            let content = std::fs::read_to_string(&audit).unwrap();
            let last: Frame = serde_json::from_str(content.lines().last().unwrap()).unwrap();
            assert_eq!(content.lines().count(), i as usize + 1);
            assert_eq!(last, Frame::new(i, vec![i as u8]));
        }
    }

    #[tokio::test]
    async fn test_unavailable_audit_file_is_transport_error() {
        let driver = ReplayDriver::from_frames(vec![])
            .with_audit_path("/nonexistent-dir/canlink/sent.jsonl");

        let err = driver.write_frame(&Frame::new(1, vec![])).await.unwrap_err();
        assert!(matches!(err, DriverError::Transport(_)));
        assert!(driver.recorded().is_empty());
    }
}
