//! canlinkd - canlink daemon
//!
//! HTTP gateway that opens CAN bus sessions on request, sends frames on them
//! and streams received frames to subscribers over SSE.
//!
//! Usage:
//!   canlinkd serve [--config canlinkd.toml] [--port 18090]
//!   canlinkd replay --send data/send.json --receive data/receive.json
//!   canlinkd smoke --server http://localhost:18090 --channel can0

mod commands;
mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use canlink_core::{parse_can_id, CanId};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

const DEFAULT_LOG_FILTER: &str =
    "canlinkd=info,canlink_api=info,canlink_session=info,canlink_driver=debug";

#[derive(Parser)]
#[command(name = "canlinkd")]
#[command(author, version, about = "CAN bus session gateway")]
#[command(propagate_version = true)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Configuration file (TOML)
        #[arg(short, long, env = "CANLINK_CONFIG")]
        config: Option<PathBuf>,

        /// Listen port (overrides the config file)
        #[arg(short, long, env = "CANLINK_PORT")]
        port: Option<u16>,
    },

    /// Send and receive frame files over a replay bus, without a server
    Replay {
        /// Frames to send (JSON)
        #[arg(long, default_value = "data/send.json")]
        send: PathBuf,

        /// Frames to receive (JSON)
        #[arg(long, default_value = "data/receive.json")]
        receive: PathBuf,

        /// Append sent frames to this file as JSON lines
        #[arg(long)]
        audit: Option<PathBuf>,

        /// Pause between frames in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },

    /// Exercise a running server: connect, send, subscribe, disconnect
    Smoke {
        /// Server URL
        #[arg(short, long, env = "CANLINK_SERVER", default_value = "http://localhost:18090")]
        server: String,

        /// Channel to open a session on (repeatable)
        #[arg(long = "channel", default_value = "can0")]
        channels: Vec<String>,

        /// Frames to send on the first session (JSON); defaults to one frame
        #[arg(long)]
        send: Option<PathBuf>,

        /// CAN identifier to subscribe to (decimal or 0x hex)
        #[arg(long, default_value = "0x123", value_parser = parse_can_id)]
        can_id: CanId,

        /// How long to stay subscribed
        #[arg(long, default_value_t = 5)]
        duration_secs: u64,

        /// Pause between sends in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Serve { config, port } => {
            tracing::info!("Starting canlinkd");
            match &config {
                Some(path) => tracing::info!("Loading config from: {}", path.display()),
                None => tracing::info!("No config file provided, using mock driver"),
            }
            let config = Config::load_or_default(config.as_deref())?;
            commands::serve::run(config, port).await
        }
        Commands::Replay {
            send,
            receive,
            audit,
            interval_ms,
        } => {
            commands::replay::run(
                &send,
                &receive,
                audit.as_deref(),
                Duration::from_millis(interval_ms),
            )
            .await?;
            Ok(())
        }
        Commands::Smoke {
            server,
            channels,
            send,
            can_id,
            duration_secs,
            interval_ms,
        } => {
            commands::smoke::run(commands::smoke::SmokeOptions {
                server: &server,
                channels: &channels,
                send_file: send.as_deref(),
                can_id,
                duration: Duration::from_secs(duration_secs),
                interval: Duration::from_millis(interval_ms),
            })
            .await
        }
    }
}
