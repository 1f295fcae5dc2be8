//! Shared types for proctor
//!
//! This crate defines the vocabulary shared between the dispatch engine,
//! configuration, signal sources and hosts:
//! - Violation types, details and events
//! - Throttle tables
//! - Session status reporting
//! - Environment signal samples
//! - Versioned event envelopes

mod events;
mod signals;
mod types;

pub use events::*;
pub use signals::*;
pub use types::*;

/// Current API version
pub const API_VERSION: u32 = 1;
