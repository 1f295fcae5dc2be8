//! Translation of raw signal samples into engine observations

use proctor_api::{EnvironmentSignal, ViolationDetails, ViolationType};
use tracing::info;

/// One input to the dispatch engine
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub kind: ViolationType,
    pub active: bool,
    pub details: ViolationDetails,
}

impl Observation {
    pub fn new(kind: ViolationType, active: bool) -> Self {
        Self {
            kind,
            active,
            details: ViolationDetails::new(),
        }
    }

    pub fn with_details(mut self, details: ViolationDetails) -> Self {
        self.details = details;
        self
    }
}

/// Observations for one face-detection sample.
///
/// Both face types are always reported so that a change in count closes
/// whichever violation no longer applies.
pub fn face_observations(count: usize) -> [Observation; 2] {
    match count {
        0 => [
            Observation::new(ViolationType::NoFace, true),
            Observation::new(ViolationType::MultipleFaces, false),
        ],
        1 => [
            Observation::new(ViolationType::NoFace, false),
            Observation::new(ViolationType::MultipleFaces, false),
        ],
        n => [
            Observation::new(ViolationType::NoFace, false),
            Observation::new(ViolationType::MultipleFaces, true)
                .with_details(ViolationDetails::with_count(n)),
        ],
    }
}

/// Observation for one environment signal
pub fn environment_observation(signal: EnvironmentSignal) -> Observation {
    match signal {
        EnvironmentSignal::Fullscreen { active } => {
            Observation::new(ViolationType::FullscreenExit, !active)
        }
        EnvironmentSignal::Visibility { hidden } => {
            Observation::new(ViolationType::TabSwitch, hidden)
        }
        EnvironmentSignal::Clipboard { action } => {
            Observation::new(ViolationType::CopyPasteAttempt, true)
                .with_details(ViolationDetails::with_event_type(action.as_str()))
        }
        EnvironmentSignal::Screens { extended } => {
            let extended = extended.unwrap_or_else(|| {
                info!("Screen layout unavailable on this host, assuming a single screen");
                false
            });
            Observation::new(ViolationType::MultipleScreens, extended)
        }
    }
}
