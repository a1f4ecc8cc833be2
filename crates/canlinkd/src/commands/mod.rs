//! Subcommand implementations

pub mod replay;
pub mod serve;
pub mod smoke;
