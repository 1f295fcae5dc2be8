//! Host capabilities model

use proctor_api::{CheckKind, EnabledChecks};
use serde::{Deserialize, Serialize};

/// Describes which signals a host can produce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    /// Can count faces in the camera feed
    pub face_detection: bool,

    /// Can observe fullscreen changes
    pub fullscreen: bool,

    /// Can observe page/tab visibility
    pub visibility: bool,

    /// Can observe clipboard events
    pub clipboard: bool,

    /// Can tell whether the display is extended across screens
    pub screen_enumeration: bool,
}

impl HostCapabilities {
    /// Environment signals only, no camera
    pub fn minimal() -> Self {
        Self {
            face_detection: false,
            fullscreen: true,
            visibility: true,
            clipboard: true,
            screen_enumeration: false,
        }
    }

    /// Every signal available
    pub fn full() -> Self {
        Self {
            face_detection: true,
            fullscreen: true,
            visibility: true,
            clipboard: true,
            screen_enumeration: true,
        }
    }

    pub fn supports(&self, check: CheckKind) -> bool {
        match check {
            CheckKind::FaceDetection => self.face_detection,
            CheckKind::Fullscreen => self.fullscreen,
            CheckKind::TabSwitch => self.visibility,
            CheckKind::CopyPaste => self.clipboard,
            // Unknown screen layout is reported as a single screen
            CheckKind::MultipleScreens => true,
        }
    }

    /// Narrow `requested` to what this host supports.
    ///
    /// Returns the effective checks and the checks that had to be dropped.
    pub fn restrict(&self, requested: EnabledChecks) -> (EnabledChecks, Vec<CheckKind>) {
        let mut effective = requested;
        let mut dropped = Vec::new();
        for check in CheckKind::ALL {
            if requested.is_enabled(check) && !self.supports(check) {
                effective.set(check, false);
                dropped.push(check);
            }
        }
        (effective, dropped)
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::minimal()
    }
}
