//! Environment signal samples produced by host monitors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Clipboard action that triggered a copy/paste violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardAction {
    Copy,
    Paste,
    Cut,
}

impl ClipboardAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipboardAction::Copy => "copy",
            ClipboardAction::Paste => "paste",
            ClipboardAction::Cut => "cut",
        }
    }
}

impl fmt::Display for ClipboardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single environment observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvironmentSignal {
    /// Fullscreen state changed
    Fullscreen { active: bool },

    /// Page visibility changed
    Visibility { hidden: bool },

    /// A clipboard event fired
    Clipboard { action: ClipboardAction },

    /// Screen layout sampled. `None` when the host cannot tell.
    Screens { extended: Option<bool> },
}

/// Environment state sampled once when monitoring starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub fullscreen: bool,
    pub hidden: bool,
    pub screens_extended: Option<bool>,
}

impl EnvironmentSnapshot {
    /// Signals equivalent to this snapshot, in the order they are checked
    pub fn signals(&self) -> [EnvironmentSignal; 3] {
        [
            EnvironmentSignal::Fullscreen {
                active: self.fullscreen,
            },
            EnvironmentSignal::Visibility {
                hidden: self.hidden,
            },
            EnvironmentSignal::Screens {
                extended: self.screens_extended,
            },
        ]
    }
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            fullscreen: true,
            hidden: false,
            screens_extended: Some(false),
        }
    }
}

/// One sample from any signal source, in arrival order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSample {
    /// Faces counted in one camera frame
    Faces(usize),

    Environment(EnvironmentSignal),
}
