//! canlink Client Library
//!
//! Provides a typed HTTP client for canlink servers.
//!
//! # Example
//!
//! ```rust,no_run
//! use canlink_client::CanLinkClient;
//! use canlink_core::Frame;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CanLinkClient::new("http://localhost:18090")?;
//!
//!     let session = client.connect("can0").await?;
//!     client.send(&session.id, &Frame::new(0x123, vec![1, 2, 3, 4])).await?;
//!     client.disconnect(&session.id).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module runs a router on an ephemeral port:
//!
//! ```rust,ignore
//! use canlink_client::testing::TestServer;
//! use canlink_api::{create_router, AppState};
//!
//! let server = TestServer::start(create_router(state)).await?;
//! let sessions = server.client().list_sessions().await?;
//! ```

mod client;
mod error;
pub mod streaming;
pub mod testing;
mod types;

pub use client::CanLinkClient;
pub use error::{CanLinkClientError, Result};
pub use types::*;

pub use streaming::{FrameStream, StreamError};

// Re-export core types for convenience
pub use canlink_core::{Frame, FrameEvent};
