//! canlink-core - Core frame, driver and bus abstractions
//!
//! This crate provides the transport-agnostic pieces every other canlink
//! crate builds on:
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌─────────────────────────┐
//! │ Frame        │ ──▶ │ Bus          │ ──▶ │ dyn Driver               │
//! │ (id + bytes) │     │ send/receive │     │ mock / replay / socketcan│
//! └──────────────┘     └──────────────┘     └─────────────────────────┘
//! ```
//!
//! Concrete drivers live in `canlink-driver`; sessions and streaming in
//! `canlink-session`.

pub mod bus;
pub mod driver;
pub mod error;
pub mod event;
pub mod frame;

pub use bus::Bus;
pub use driver::{Driver, DriverFactory};
pub use error::{DriverError, DriverResult};
pub use event::FrameEvent;
pub use frame::{parse_can_id, CanId, Frame, CLASSIC_MAX_DLC, EXTENDED_ID_MAX, STANDARD_ID_MAX};
