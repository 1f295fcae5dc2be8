//! Proctoring session controller
//!
//! Owns one dispatch engine plus the lifecycle flags and listener
//! bookkeeping around it. Status transitions are reported to the host's
//! [`StatusSink`]:
//!
//! Initializing -> Starting -> Running -> Stopping -> Stopped (-> Destroyed)
//!
//! with Error reported before a failed start is stopped.

use proctor_api::{
    EnabledChecks, EnvironmentSignal, EnvironmentSnapshot, SessionStatus, StatusUpdate,
    ThrottleTable,
};
use proctor_config::Policy;
use proctor_util::{MonotonicInstant, ProctorError, Result, SessionId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

use crate::engine::ViolationDispatcher;
use crate::listeners::ListenerRegistry;
use crate::signals::{Observation, environment_observation, face_observations};
use crate::sink::{Delivery, StatusSink, ViolationSink, deliver};

/// What a session monitors and how often it may notify
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub throttles: ThrottleTable,
    pub checks: EnabledChecks,
}

impl SessionConfig {
    pub fn from_policy(policy: &Policy) -> Self {
        Self {
            throttles: policy.throttles.clone(),
            checks: policy.checks,
        }
    }
}

pub struct ProctorSession {
    id: SessionId,
    checks: EnabledChecks,
    dispatcher: ViolationDispatcher,
    status_sink: Arc<dyn StatusSink>,
    listeners: ListenerRegistry,
    running: Arc<AtomicBool>,
    status: SessionStatus,
    destroyed: bool,
}

impl ProctorSession {
    pub fn new(
        config: SessionConfig,
        violation_sink: Arc<dyn ViolationSink>,
        status_sink: Arc<dyn StatusSink>,
    ) -> Self {
        let mut session = Self {
            id: SessionId::new(),
            checks: config.checks,
            dispatcher: ViolationDispatcher::new(config.throttles, violation_sink),
            status_sink,
            listeners: ListenerRegistry::new(),
            running: Arc::new(AtomicBool::new(false)),
            status: SessionStatus::Initializing,
            destroyed: false,
        };

        info!(session_id = %session.id, checks = ?session.checks, "Session created");
        session.emit(StatusUpdate::new(
            SessionStatus::Initializing,
            "Initializing proctoring session",
        ));
        session
    }

    pub fn from_policy(
        policy: &Policy,
        violation_sink: Arc<dyn ViolationSink>,
        status_sink: Arc<dyn StatusSink>,
    ) -> Self {
        Self::new(SessionConfig::from_policy(policy), violation_sink, status_sink)
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn checks(&self) -> &EnabledChecks {
        &self.checks
    }

    pub fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Shared running flag, for sources that sample on their own task
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn dispatcher(&self) -> &ViolationDispatcher {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut ViolationDispatcher {
        &mut self.dispatcher
    }

    pub fn listeners_mut(&mut self) -> &mut ListenerRegistry {
        &mut self.listeners
    }

    /// Announce that sources are being started.
    ///
    /// Returns `Ok(false)` without side effects if the session is already
    /// running.
    pub fn begin_start(&mut self) -> Result<bool> {
        if self.destroyed {
            return Err(ProctorError::SessionDestroyed);
        }
        if self.is_active() {
            warn!(session_id = %self.id, "Proctoring already active");
            return Ok(false);
        }

        self.emit(StatusUpdate::new(
            SessionStatus::Starting,
            "Starting proctoring",
        ));
        Ok(true)
    }

    /// Mark sources as attached and start accepting observations
    pub fn mark_running(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(ProctorError::SessionDestroyed);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ProctorError::SessionAlreadyRunning);
        }

        info!(
            session_id = %self.id,
            listeners = self.listeners.len(),
            "Proctoring started"
        );
        self.emit(StatusUpdate::new(
            SessionStatus::Running,
            "Proctoring started successfully",
        ));
        Ok(())
    }

    /// Report a start failure, then tear down whatever was attached
    pub fn fail(&mut self, message: impl Into<String>, error: impl Into<String>) {
        let update = StatusUpdate::new(SessionStatus::Error, message).with_error(error);
        error!(
            session_id = %self.id,
            message = %update.message,
            error = ?update.error,
            "Proctoring failed to start"
        );
        self.emit(update);
        self.stop();
    }

    /// Feed one face-detection sample. Returns the number of notifications.
    pub fn ingest_faces(&mut self, count: usize) -> usize {
        self.ingest_faces_at(count, MonotonicInstant::now())
    }

    pub fn ingest_faces_at(&mut self, count: usize, now: MonotonicInstant) -> usize {
        face_observations(count)
            .into_iter()
            .filter(|o| self.apply(o.clone(), now))
            .count()
    }

    /// Feed one environment signal. Returns whether the host was notified.
    pub fn ingest_environment(&mut self, signal: EnvironmentSignal) -> bool {
        self.ingest_environment_at(signal, MonotonicInstant::now())
    }

    pub fn ingest_environment_at(&mut self, signal: EnvironmentSignal, now: MonotonicInstant) -> bool {
        self.apply(environment_observation(signal), now)
    }

    /// Feed the environment state sampled when monitoring starts
    pub fn ingest_snapshot(&mut self, snapshot: EnvironmentSnapshot) -> usize {
        let now = MonotonicInstant::now();
        snapshot
            .signals()
            .into_iter()
            .filter(|&signal| self.ingest_environment_at(signal, now))
            .count()
    }

    /// Stop proctoring: detach every listener and close open violations.
    ///
    /// No-op once the session is stopped.
    pub fn stop(&mut self) {
        if matches!(self.status, SessionStatus::Stopped | SessionStatus::Destroyed) {
            debug!(session_id = %self.id, "Session already stopped");
            return;
        }

        self.emit(StatusUpdate::new(
            SessionStatus::Stopping,
            "Stopping proctoring",
        ));

        self.running.store(false, Ordering::SeqCst);
        let detached = self.listeners.remove_all();
        let closed = self.dispatcher.reset();

        info!(
            session_id = %self.id,
            detached,
            closed,
            "Proctoring stopped"
        );
        self.emit(StatusUpdate::new(
            SessionStatus::Stopped,
            "Proctoring stopped",
        ));
    }

    /// Stop and release the session. It cannot be started again.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop();
        self.destroyed = true;
        self.emit(StatusUpdate::new(
            SessionStatus::Destroyed,
            "Proctoring session destroyed",
        ));
    }

    fn apply(&mut self, observation: Observation, now: MonotonicInstant) -> bool {
        if !self.is_active() {
            debug!(violation = %observation.kind, "Observation ignored, session not running");
            return false;
        }
        if !self.checks.is_enabled(observation.kind.check()) {
            return false;
        }

        self.dispatcher
            .observe_at(observation.kind, observation.active, observation.details, now)
    }

    fn emit(&mut self, update: StatusUpdate) {
        self.status = update.status;
        match deliver(|| self.status_sink.on_status_change(&update)) {
            Delivery::Delivered => {
                debug!(status = ?update.status, message = %update.message, "Status reported");
            }
            Delivery::Failed(e) => {
                error!(status = ?update.status, error = %e, "Error in status callback");
            }
            Delivery::Panicked(e) => {
                error!(status = ?update.status, panic = %e, "Status callback panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{NoopSink, Recorder, SinkResult};
    use proctor_api::{ClipboardAction, ViolationEvent, ViolationType};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Harness {
        session: ProctorSession,
        violations: Arc<Recorder<ViolationEvent>>,
        statuses: Arc<Recorder<StatusUpdate>>,
    }

    fn harness(config: SessionConfig) -> Harness {
        let violations = Arc::new(Recorder::new());
        let statuses = Arc::new(Recorder::new());
        let session = ProctorSession::new(config, violations.clone(), statuses.clone());
        Harness {
            session,
            violations,
            statuses,
        }
    }

    fn start(h: &mut Harness) {
        assert!(h.session.begin_start().unwrap());
        h.session.mark_running().unwrap();
    }

    fn statuses(h: &Harness) -> Vec<SessionStatus> {
        h.statuses.snapshot().iter().map(|u| u.status).collect()
    }

    #[test]
    fn test_lifecycle_statuses() {
        let mut h = harness(SessionConfig::default());
        assert_eq!(statuses(&h), vec![SessionStatus::Initializing]);
        assert!(!h.session.is_active());

        start(&mut h);
        assert!(h.session.is_active());
        assert_eq!(h.session.status(), SessionStatus::Running);

        h.session.stop();
        assert!(!h.session.is_active());
        assert_eq!(
            statuses(&h),
            vec![
                SessionStatus::Initializing,
                SessionStatus::Starting,
                SessionStatus::Running,
                SessionStatus::Stopping,
                SessionStatus::Stopped,
            ]
        );
    }

    #[test]
    fn test_begin_start_while_running() {
        let mut h = harness(SessionConfig::default());
        start(&mut h);
        let before = h.statuses.len();

        assert!(!h.session.begin_start().unwrap());
        assert_eq!(h.statuses.len(), before);
        assert!(matches!(
            h.session.mark_running(),
            Err(ProctorError::SessionAlreadyRunning)
        ));
    }

    #[test]
    fn test_observations_ignored_until_running() {
        let mut h = harness(SessionConfig::default());
        assert_eq!(h.session.ingest_faces(0), 0);
        assert!(!h.session.ingest_environment(EnvironmentSignal::Visibility { hidden: true }));
        assert!(h.violations.is_empty());
        assert!(h.session.dispatcher().active_types().is_empty());
    }

    #[test]
    fn test_face_samples_reach_engine() {
        let mut h = harness(SessionConfig::default());
        start(&mut h);
        let t0 = MonotonicInstant::now();

        assert_eq!(h.session.ingest_faces_at(0, t0), 1);
        assert_eq!(h.session.ingest_faces_at(3, t0 + Duration::from_millis(10)), 2);

        let events = h.violations.take();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, ViolationType::NoFace);
        assert!(events[0].active);
        assert_eq!(events[1].kind, ViolationType::NoFace);
        assert!(!events[1].active);
        assert_eq!(events[2].kind, ViolationType::MultipleFaces);
        assert_eq!(h.session.dispatcher().multiple_face_count(), 3);
    }

    #[test]
    fn test_disabled_checks_never_reach_engine() {
        let mut checks = EnabledChecks::all();
        checks.copy_paste = false;
        checks.face_detection = false;
        let mut h = harness(SessionConfig {
            throttles: ThrottleTable::zero(),
            checks,
        });
        start(&mut h);

        assert_eq!(h.session.ingest_faces(0), 0);
        assert!(!h.session.ingest_environment(EnvironmentSignal::Clipboard {
            action: ClipboardAction::Copy,
        }));
        assert!(h.session.ingest_environment(EnvironmentSignal::Fullscreen { active: false }));

        let events = h.violations.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ViolationType::FullscreenExit);
    }

    #[test]
    fn test_snapshot_reports_initial_state() {
        let mut h = harness(SessionConfig::default());
        start(&mut h);

        let notified = h.session.ingest_snapshot(EnvironmentSnapshot {
            fullscreen: false,
            hidden: false,
            screens_extended: Some(true),
        });
        assert_eq!(notified, 2);
        assert!(h.session.dispatcher().is_active(ViolationType::FullscreenExit));
        assert!(h.session.dispatcher().is_active(ViolationType::MultipleScreens));
        assert!(!h.session.dispatcher().is_active(ViolationType::TabSwitch));
    }

    #[test]
    fn test_stop_closes_violations_and_detaches() {
        let detached = Arc::new(AtomicUsize::new(0));
        let mut h = harness(SessionConfig::default());
        start(&mut h);

        for event in ["copy", "paste"] {
            let counter = detached.clone();
            h.session.listeners_mut().register("document", event, "environment-monitor", move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        h.session.ingest_environment(EnvironmentSignal::Visibility { hidden: true });
        h.session.ingest_faces(2);
        h.violations.take();

        h.session.stop();

        assert_eq!(detached.load(Ordering::SeqCst), 2);
        assert!(h.session.listeners_mut().is_empty());

        let closing = h.violations.take();
        assert_eq!(closing.len(), 2);
        assert!(closing.iter().all(|e| !e.active));
        assert!(h.session.dispatcher().active_types().is_empty());

        // Observations after stop are dropped
        assert!(!h.session.ingest_environment(EnvironmentSignal::Visibility { hidden: true }));
    }

    #[test]
    fn test_stop_twice_reports_once() {
        let mut h = harness(SessionConfig::default());
        start(&mut h);
        h.session.stop();
        let count = h.statuses.len();
        h.session.stop();
        assert_eq!(h.statuses.len(), count);
    }

    #[test]
    fn test_restart_after_stop() {
        let mut h = harness(SessionConfig::default());
        start(&mut h);
        h.session.stop();
        start(&mut h);
        assert!(h.session.ingest_environment(EnvironmentSignal::Visibility { hidden: true }));
    }

    #[test]
    fn test_fail_reports_error_then_stops() {
        let mut h = harness(SessionConfig::default());
        assert!(h.session.begin_start().unwrap());
        h.session.fail("Failed to start proctoring", "camera permission denied");

        let updates = h.statuses.snapshot();
        let error = updates
            .iter()
            .find(|u| u.status == SessionStatus::Error)
            .unwrap();
        assert_eq!(error.error.as_deref(), Some("camera permission denied"));
        assert_eq!(updates.last().unwrap().status, SessionStatus::Stopped);
        assert!(!h.session.is_active());
    }

    #[test]
    fn test_destroy() {
        let mut h = harness(SessionConfig::default());
        start(&mut h);
        h.session.ingest_faces(0);
        h.violations.take();

        h.session.destroy();
        assert_eq!(h.session.status(), SessionStatus::Destroyed);
        assert_eq!(h.violations.len(), 1);
        assert!(matches!(
            h.session.begin_start(),
            Err(ProctorError::SessionDestroyed)
        ));

        let count = h.statuses.len();
        h.session.destroy();
        assert_eq!(h.statuses.len(), count);
    }

    #[test]
    fn test_failing_status_sink_is_contained() {
        let status_sink = |update: &StatusUpdate| -> SinkResult {
            if update.status == SessionStatus::Running {
                panic!("status listener crashed");
            }
            Err(ProctorError::callback("status listener rejected update"))
        };
        let mut session = ProctorSession::new(
            SessionConfig::default(),
            Arc::new(NoopSink),
            Arc::new(status_sink),
        );

        assert!(session.begin_start().unwrap());
        session.mark_running().unwrap();
        assert!(session.is_active());
        session.stop();
        assert_eq!(session.status(), SessionStatus::Stopped);
    }

    #[test]
    fn test_from_policy() {
        let mut policy = Policy::default();
        policy.checks.tab_switch = false;
        policy
            .throttles
            .set(ViolationType::NoFace, Duration::from_millis(42));

        let session = ProctorSession::from_policy(&policy, Arc::new(NoopSink), Arc::new(NoopSink));
        assert!(!session.checks().tab_switch);
        assert_eq!(
            session.dispatcher().throttle(ViolationType::NoFace),
            Duration::from_millis(42)
        );
    }
}
