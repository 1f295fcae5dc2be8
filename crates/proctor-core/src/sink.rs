//! Host callback surfaces
//!
//! Hosts receive violations and status changes through these traits. Any
//! `Fn(&T) -> SinkResult` closure implements them.

use proctor_api::{StatusUpdate, ViolationEvent};
use proctor_util::ProctorError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Mutex;

pub type SinkResult = Result<(), ProctorError>;

/// Receives violation notifications
pub trait ViolationSink: Send + Sync {
    fn on_violation(&self, event: &ViolationEvent) -> SinkResult;
}

/// Receives session status changes
pub trait StatusSink: Send + Sync {
    fn on_status_change(&self, update: &StatusUpdate) -> SinkResult;
}

impl<F> ViolationSink for F
where
    F: Fn(&ViolationEvent) -> SinkResult + Send + Sync,
{
    fn on_violation(&self, event: &ViolationEvent) -> SinkResult {
        self(event)
    }
}

impl<F> StatusSink for F
where
    F: Fn(&StatusUpdate) -> SinkResult + Send + Sync,
{
    fn on_status_change(&self, update: &StatusUpdate) -> SinkResult {
        self(update)
    }
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ViolationSink for NoopSink {
    fn on_violation(&self, _event: &ViolationEvent) -> SinkResult {
        Ok(())
    }
}

impl StatusSink for NoopSink {
    fn on_status_change(&self, _update: &StatusUpdate) -> SinkResult {
        Ok(())
    }
}

/// Sink that keeps every item it receives, for hosts that poll
#[derive(Debug)]
pub struct Recorder<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> Recorder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, item: &T) -> SinkResult {
        self.items
            .lock()
            .map_err(|_| ProctorError::internal("recorder lock poisoned"))?
            .push(item.clone());
        Ok(())
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> Vec<T> {
        self.items.lock().map(|v| v.clone()).unwrap_or_default()
    }

    /// Drain everything recorded so far
    pub fn take(&self) -> Vec<T> {
        self.items
            .lock()
            .map(|mut v| std::mem::take(&mut *v))
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ViolationSink for Recorder<ViolationEvent> {
    fn on_violation(&self, event: &ViolationEvent) -> SinkResult {
        self.push(event)
    }
}

impl StatusSink for Recorder<StatusUpdate> {
    fn on_status_change(&self, update: &StatusUpdate) -> SinkResult {
        self.push(update)
    }
}

/// Outcome of handing an item to a host callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Failed(String),
    Panicked(String),
}

/// Run a host callback, turning errors and panics into a `Delivery`
pub(crate) fn deliver(callback: impl FnOnce() -> SinkResult) -> Delivery {
    match panic::catch_unwind(AssertUnwindSafe(callback)) {
        Ok(Ok(())) => Delivery::Delivered,
        Ok(Err(e)) => Delivery::Failed(e.to_string()),
        Err(payload) => Delivery::Panicked(panic_message(&*payload)),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_api::SessionStatus;

    #[test]
    fn closure_is_a_status_sink() {
        let recorder = Recorder::<StatusUpdate>::new();
        let sink = |update: &StatusUpdate| recorder.on_status_change(update);

        sink.on_status_change(&StatusUpdate::new(SessionStatus::Running, "ok"))
            .unwrap();
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.take()[0].status, SessionStatus::Running);
        assert!(recorder.is_empty());
    }

    #[test]
    fn deliver_reports_errors() {
        let outcome = deliver(|| Err(ProctorError::callback("host exploded")));
        assert_eq!(
            outcome,
            Delivery::Failed("Callback error: host exploded".to_string())
        );
    }

    #[test]
    fn deliver_catches_panics() {
        let outcome = deliver(|| panic!("host panicked"));
        assert_eq!(outcome, Delivery::Panicked("host panicked".to_string()));

        let code = 7;
        let outcome = deliver(|| panic!("host panicked with {}", code));
        assert_eq!(outcome, Delivery::Panicked("host panicked with 7".to_string()));
    }

    #[test]
    fn deliver_ok() {
        assert_eq!(deliver(|| Ok(())), Delivery::Delivered);
    }
}
