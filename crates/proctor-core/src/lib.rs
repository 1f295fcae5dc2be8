//! Violation dispatch engine and session controller for proctor
//!
//! This crate is the heart of proctor, containing:
//! - The violation dispatch engine (edge detection + per-type throttling)
//! - Translation of raw face counts and environment signals into observations
//! - A listener registry with scoped bulk removal
//! - The session lifecycle (Initializing -> Starting -> Running -> Stopping -> Stopped)

mod engine;
mod listeners;
mod session;
mod signals;
mod sink;

pub use engine::*;
pub use listeners::*;
pub use session::*;
pub use signals::*;
pub use sink::*;
