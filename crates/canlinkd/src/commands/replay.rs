//! `canlinkd replay` - offline bus run over frame files
//!
//! Sends every frame of the send file, then drains the receive file through
//! a replay driver, pausing between frames.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use canlink_core::Bus;
use canlink_driver::{load_frames, ReplayDriver};

/// Outcome of a replay run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub sent: usize,
    pub send_errors: usize,
    pub received: usize,
}

pub async fn run(
    send_file: &Path,
    receive_file: &Path,
    audit_file: Option<&Path>,
    interval: Duration,
) -> Result<ReplaySummary> {
    let send_frames = load_frames(send_file)
        .with_context(|| format!("Failed to load send frames: {}", send_file.display()))?;
    let driver = ReplayDriver::open(receive_file)
        .with_context(|| format!("Failed to load receive frames: {}", receive_file.display()))?;
    let driver = match audit_file {
        Some(path) => driver.with_audit_path(path),
        None => driver,
    };

    let bus = Bus::new(Box::new(driver));
    let mut summary = ReplaySummary::default();

    for frame in &send_frames {
        match bus.send(frame).await {
            Ok(()) => {
                tracing::info!("Send: {}", frame);
                summary.sent += 1;
            }
            Err(e) => {
                tracing::warn!("Send error for {}: {}", frame, e);
                summary.send_errors += 1;
            }
        }
        tokio::time::sleep(interval).await;
    }

    while !bus.is_exhausted() {
        match bus.receive().await {
            Ok(frame) => {
                tracing::info!("Receive: {}", frame);
                summary.received += 1;
            }
            Err(e) => {
                tracing::warn!("Receive error: {}", e);
                break;
            }
        }
        tokio::time::sleep(interval).await;
    }

    tracing::info!(
        sent = summary.sent,
        send_errors = summary.send_errors,
        received = summary.received,
        "Replay finished"
    );
    Ok(summary)
}
