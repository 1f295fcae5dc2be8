//! Mock signal sources for testing

use async_trait::async_trait;
use proctor_api::{EnvironmentSignal, EnvironmentSnapshot};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::{EnvironmentMonitor, FaceDetector, HostCapabilities, HostError, HostResult};

/// Mock face detector that replays queued face counts.
///
/// Once the queue drains, the last count is repeated.
pub struct MockDetector {
    samples: Mutex<VecDeque<usize>>,
    last: Mutex<usize>,
    ready: AtomicBool,
    calls: AtomicUsize,

    /// Configure detection to fail
    pub fail_detect: Arc<Mutex<bool>>,
}

impl MockDetector {
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(VecDeque::new()),
            last: Mutex::new(1),
            ready: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            fail_detect: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_samples(samples: impl IntoIterator<Item = usize>) -> Self {
        let detector = Self::new();
        detector.push_samples(samples);
        detector
    }

    pub fn push_samples(&self, samples: impl IntoIterator<Item = usize>) {
        self.samples.lock().unwrap().extend(samples);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Number of detection passes attempted
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceDetector for MockDetector {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn detect(&self) -> HostResult<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if *self.fail_detect.lock().unwrap() {
            return Err(HostError::DetectionFailed("Mock detection failure".into()));
        }

        let mut last = self.last.lock().unwrap();
        if let Some(next) = self.samples.lock().unwrap().pop_front() {
            *last = next;
        }
        Ok(*last)
    }
}

/// Mock environment monitor driven by test code
pub struct MockEnvironment {
    capabilities: HostCapabilities,
    snapshot: Mutex<EnvironmentSnapshot>,
    event_tx: mpsc::UnboundedSender<EnvironmentSignal>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<EnvironmentSignal>>>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            capabilities: HostCapabilities::full(),
            snapshot: Mutex::new(EnvironmentSnapshot::default()),
            event_tx: tx,
            event_rx: Mutex::new(Some(rx)),
        }
    }

    pub fn with_capabilities(mut self, caps: HostCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    pub fn with_snapshot(self, snapshot: EnvironmentSnapshot) -> Self {
        *self.snapshot.lock().unwrap() = snapshot;
        self
    }

    /// Simulate an environment change
    pub fn emit(&self, signal: EnvironmentSignal) {
        {
            let mut snapshot = self.snapshot.lock().unwrap();
            match signal {
                EnvironmentSignal::Fullscreen { active } => snapshot.fullscreen = active,
                EnvironmentSignal::Visibility { hidden } => snapshot.hidden = hidden,
                EnvironmentSignal::Screens { extended } => snapshot.screens_extended = extended,
                EnvironmentSignal::Clipboard { .. } => {}
            }
        }
        let _ = self.event_tx.send(signal);
    }
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentMonitor for MockEnvironment {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    fn snapshot(&self) -> EnvironmentSnapshot {
        *self.snapshot.lock().unwrap()
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<EnvironmentSignal> {
        self.event_rx
            .lock()
            .unwrap()
            .take()
            .expect("subscribe() can only be called once")
    }
}
