//! Violation events and the envelope used to stream them to hosts

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::{API_VERSION, StatusUpdate, ViolationDetails, ViolationType};

/// A violation notification delivered to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEvent {
    #[serde(rename = "type")]
    pub kind: ViolationType,
    pub active: bool,
    pub message: String,
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub details: ViolationDetails,
}

/// Event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub api_version: u32,
    pub timestamp: DateTime<Local>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(payload: EventPayload) -> Self {
        Self {
            api_version: API_VERSION,
            timestamp: proctor_util::now(),
            payload,
        }
    }
}

/// Everything a session reports to its host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventPayload {
    /// A violation was raised or cleared
    Violation(ViolationEvent),

    /// Session lifecycle changed
    Status(StatusUpdate),
}
