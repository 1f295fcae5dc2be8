//! Shared utilities for proctor
//!
//! This crate provides:
//! - ID types (SessionId, ListenerId)
//! - Time utilities (monotonic time for throttling, wall clock for event stamps)
//! - Error types
//! - Default paths for the configuration file

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
