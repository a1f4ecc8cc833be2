//! Streaming support for frame subscriptions
//!
//! Subscriptions are served as SSE (Server-Sent Events); each event carries
//! one JSON [`FrameEvent`](canlink_core::FrameEvent).
//!
//! # Example
//!
//! ```no_run
//! use canlink_client::CanLinkClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CanLinkClient::new("http://localhost:18090")?;
//! let session = client.connect("can0").await?;
//!
//! let mut frames = client.subscribe(&session.id, 0x123).await?;
//! while let Some(event) = frames.next().await {
//!     match event {
//!         Ok(event) => println!("{} {}", event.timestamp, event.frame),
//!         Err(e) => {
//!             eprintln!("Stream error: {}", e);
//!             break;
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod parser;
mod subscription;
mod types;

pub use parser::SseParser;
pub use subscription::FrameStream;
pub use types::{StreamError, StreamResult};
