//! `canlinkd smoke` - drive a running server through a full session cycle
//!
//! connect (one session per channel) -> send -> subscribe for a while ->
//! disconnect, printing what happens along the way.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use canlink_client::{CanLinkClient, Frame};
use canlink_core::CanId;
use canlink_driver::load_frames;

pub struct SmokeOptions<'a> {
    pub server: &'a str,
    pub channels: &'a [String],
    pub send_file: Option<&'a Path>,
    pub can_id: CanId,
    pub duration: Duration,
    pub interval: Duration,
}

pub async fn run(opts: SmokeOptions<'_>) -> Result<()> {
    let client = CanLinkClient::new(opts.server)?;
    let health = client
        .health()
        .await
        .with_context(|| format!("Server not reachable at {}", opts.server))?;
    println!("Server {} health: {}", opts.server, health);

    let frames = match opts.send_file {
        Some(path) => load_frames(path)
            .with_context(|| format!("Failed to load send frames: {}", path.display()))?,
        None => vec![Frame::new(opts.can_id, vec![1, 2, 3, 4])],
    };

    let mut sessions = Vec::new();
    for channel in opts.channels {
        let connected = client
            .connect(channel)
            .await
            .with_context(|| format!("Connect to channel {} failed", channel))?;
        println!("  session: {} -> {}", channel, connected.id);
        sessions.push(connected.id);
    }

    let result = exercise(&client, &sessions, &frames, &opts).await;

    for id in &sessions {
        match client.disconnect(id).await {
            Ok(ack) => println!("  {}", ack.message),
            Err(e) => eprintln!("  disconnect {} failed: {}", id, e),
        }
    }

    result
}

async fn exercise(
    client: &CanLinkClient,
    sessions: &[String],
    frames: &[Frame],
    opts: &SmokeOptions<'_>,
) -> Result<()> {
    let Some(first) = sessions.first() else {
        anyhow::bail!("No channels given");
    };

    for frame in frames {
        let sent = client.send(first, frame).await?;
        println!("  {} ({})", sent.message, sent.timestamp);
        tokio::time::sleep(opts.interval).await;
    }

    println!(
        "Subscribing to 0x{:X} on {} for {:?}",
        opts.can_id, first, opts.duration
    );
    let mut stream = client.subscribe(first, opts.can_id).await?;
    let deadline = tokio::time::sleep(opts.duration);
    tokio::pin!(deadline);

    let mut received = 0usize;
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            event = stream.next() => match event {
                Some(Ok(event)) => {
                    received += 1;
                    println!("  [{}] {}", event.timestamp, event.frame);
                }
                Some(Err(e)) => {
                    eprintln!("  stream error: {}", e);
                    break;
                }
                None => {
                    println!("  stream closed by server");
                    break;
                }
            }
        }
    }
    stream.cancel();
    println!("Received {} frame(s)", received);
    Ok(())
}
