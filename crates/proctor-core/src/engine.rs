//! Violation dispatch engine
//!
//! Turns a stream of per-type boolean observations into host notifications:
//! - an active observation notifies when the type's throttle window has
//!   elapsed since the last notification (so a sustained violation repeats
//!   once per window)
//! - a falling edge (active -> inactive) always notifies and re-arms the type
//! - inactive -> inactive never notifies

use proctor_api::{ThrottleTable, ViolationDetails, ViolationEvent, ViolationType};
use proctor_util::{MonotonicInstant, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::sink::{Delivery, ViolationSink, deliver};

const TYPE_COUNT: usize = ViolationType::ALL.len();

/// Per-type dispatch state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViolationState {
    /// Value of the most recent observation
    pub active: bool,

    /// When the host was last notified. `None` means never (or re-armed).
    pub last_notified: Option<MonotonicInstant>,
}

/// The violation dispatch engine
pub struct ViolationDispatcher {
    throttles: ThrottleTable,
    states: [ViolationState; TYPE_COUNT],
    multiple_face_count: u64,
    sink: Arc<dyn ViolationSink>,
}

impl ViolationDispatcher {
    /// Create a new engine with every type inactive
    pub fn new(throttles: ThrottleTable, sink: Arc<dyn ViolationSink>) -> Self {
        Self {
            throttles,
            states: [ViolationState::default(); TYPE_COUNT],
            multiple_face_count: 0,
            sink,
        }
    }

    /// Replace the throttle table from raw millisecond values.
    ///
    /// Types missing from `durations` are not throttled. On error the
    /// previous table stays in effect.
    pub fn configure(&mut self, durations: HashMap<ViolationType, i64>) -> Result<()> {
        self.throttles = ThrottleTable::from_millis(durations)?;
        info!(
            throttles = ?ViolationType::ALL.map(|t| (t.as_str(), self.throttles.get(t).as_millis())),
            "Throttles configured"
        );
        Ok(())
    }

    /// Record an observation now. Returns whether the host was notified.
    pub fn observe(
        &mut self,
        kind: ViolationType,
        is_active: bool,
        details: ViolationDetails,
    ) -> bool {
        self.observe_at(kind, is_active, details, MonotonicInstant::now())
    }

    /// Record an observation at `now`. Returns whether the host was notified.
    pub fn observe_at(
        &mut self,
        kind: ViolationType,
        is_active: bool,
        details: ViolationDetails,
        now: MonotonicInstant,
    ) -> bool {
        let throttle = self.throttles.get(kind);
        let state = &mut self.states[kind as usize];

        let was_active = state.active;
        state.active = is_active;

        if kind == ViolationType::MultipleFaces && is_active {
            self.multiple_face_count = details.count().unwrap_or(0);
        }

        let notify = if is_active {
            let window_elapsed = match state.last_notified {
                None => true,
                Some(last) => now.duration_since(last) > throttle,
            };
            if window_elapsed {
                state.last_notified = Some(now);
            }
            window_elapsed
        } else if was_active {
            state.last_notified = None;
            true
        } else {
            false
        };

        if notify {
            let event = ViolationEvent {
                kind,
                active: is_active,
                message: violation_message(kind, &details),
                timestamp: proctor_util::now(),
                details,
            };
            self.dispatch(&event);
        }

        notify
    }

    /// Close every open violation, then clear all notification timestamps.
    ///
    /// Returns the number of closing notifications emitted.
    pub fn reset(&mut self) -> usize {
        self.reset_at(MonotonicInstant::now())
    }

    pub fn reset_at(&mut self, now: MonotonicInstant) -> usize {
        let open = self.active_types();
        for &kind in &open {
            self.observe_at(kind, false, ViolationDetails::new(), now);
        }

        for state in &mut self.states {
            state.last_notified = None;
        }

        if !open.is_empty() {
            info!(closed = open.len(), "Open violations closed on reset");
        }
        open.len()
    }

    pub fn is_active(&self, kind: ViolationType) -> bool {
        self.states[kind as usize].active
    }

    /// Types whose latest observation was active, in declaration order
    pub fn active_types(&self) -> Vec<ViolationType> {
        ViolationType::ALL
            .into_iter()
            .filter(|&t| self.is_active(t))
            .collect()
    }

    pub fn state(&self, kind: ViolationType) -> ViolationState {
        self.states[kind as usize]
    }

    pub fn throttle(&self, kind: ViolationType) -> Duration {
        self.throttles.get(kind)
    }

    /// Face count from the most recent MULTIPLE_FACES activation
    pub fn multiple_face_count(&self) -> u64 {
        self.multiple_face_count
    }

    fn dispatch(&self, event: &ViolationEvent) {
        match deliver(|| self.sink.on_violation(event)) {
            Delivery::Delivered => {
                debug!(
                    violation = %event.kind,
                    active = event.active,
                    message = %event.message,
                    "Violation dispatched"
                );
            }
            Delivery::Failed(e) => {
                error!(violation = %event.kind, error = %e, "Error in violation callback");
            }
            Delivery::Panicked(e) => {
                error!(violation = %event.kind, panic = %e, "Violation callback panicked");
            }
        }
    }
}

/// Human-readable message for a violation
pub fn violation_message(kind: ViolationType, details: &ViolationDetails) -> String {
    match kind {
        ViolationType::NoFace => "No face detected!".to_string(),
        ViolationType::MultipleFaces => match details.count() {
            Some(count) => format!("Multiple faces detected: {}", count),
            None => "Multiple faces detected: N/A".to_string(),
        },
        ViolationType::FullscreenExit => "User is not in fullscreen mode!".to_string(),
        ViolationType::TabSwitch => "User switched tabs or minimized window!".to_string(),
        ViolationType::CopyPasteAttempt => format!(
            "User action: {} attempt detected!",
            details.event_type().unwrap_or("copy/paste/cut")
        ),
        ViolationType::MultipleScreens => {
            "Multiple screens detected (extended display)!".to_string()
        }
    }
}
