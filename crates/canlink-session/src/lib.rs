//! canlink-session - Session registry and frame streaming
//!
//! A [`SessionRegistry`] binds clients to buses: every `connect` asks the
//! [`DriverFactory`](canlink_core::DriverFactory) for a fresh driver, wraps it
//! in a [`Bus`](canlink_core::Bus) and files it under a new [`SessionId`].
//! A [`FrameSubscription`] then streams the frames of one CAN identifier from
//! a session's bus until the subscriber goes away or the session is closed.
//!
//! # Example
//!
//! ```ignore
//! use canlink_session::{SessionRegistry, StreamConfig};
//!
//! let registry = SessionRegistry::new(Arc::new(factory));
//! let id = registry.connect("can0").await?;
//! registry.send(id.as_str(), &Frame::new(0x123, vec![1, 2, 3, 4])).await?;
//!
//! let mut events = registry
//!     .subscribe(id.as_str(), 0x123, StreamConfig::default())?
//!     .into_stream();
//! while let Some(event) = events.next().await {
//!     println!("{}", event.frame);
//! }
//! ```

pub mod error;
pub mod registry;
pub mod session;
pub mod stream;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{SessionHandle, SessionId, SessionInfo, SessionStatus};
pub use stream::{
    CloseReason, FrameSubscription, StreamConfig, SubscriptionHandle, SubscriptionState,
    DEFAULT_POLL_INTERVAL, MIN_POLL_INTERVAL,
};
