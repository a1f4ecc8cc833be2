//! HTTP request handlers for the canlink API

pub mod frames;
pub mod session;
pub mod subscribe;
