//! Signal source interfaces for proctor
//!
//! This crate defines the capability-based interface between the session
//! controller and whatever actually watches the camera and the page, plus
//! the tasks that pump their samples into a session. It contains no
//! platform code itself.

mod capabilities;
mod mock;
mod pump;
mod traits;

pub use capabilities::*;
pub use mock::*;
pub use pump::*;
pub use traits::*;
