//! NDJSON event output

use proctor_api::{Event, EventPayload, StatusUpdate, ViolationEvent};
use proctor_core::{SinkResult, StatusSink, ViolationSink};
use proctor_util::ProctorError;
use std::io::Write;
use std::sync::Mutex;

/// Writes every violation and status change as one JSON event per line
pub struct EventWriter<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> EventWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn write(&self, payload: EventPayload) -> SinkResult {
        let event = Event::new(payload);
        let mut out = self
            .out
            .lock()
            .map_err(|_| ProctorError::internal("output lock poisoned"))?;

        serde_json::to_writer(&mut *out, &event)
            .map_err(|e| ProctorError::callback(format!("Failed to encode event: {}", e)))?;
        out.write_all(b"\n")
            .and_then(|_| out.flush())
            .map_err(|e| ProctorError::callback(format!("Failed to write event: {}", e)))
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> ViolationSink for EventWriter<W> {
    fn on_violation(&self, event: &ViolationEvent) -> SinkResult {
        self.write(EventPayload::Violation(event.clone()))
    }
}

impl<W: Write + Send> StatusSink for EventWriter<W> {
    fn on_status_change(&self, update: &StatusUpdate) -> SinkResult {
        self.write(EventPayload::Status(update.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_api::{API_VERSION, SessionStatus, ViolationDetails, ViolationType};

    #[test]
    fn writes_one_event_per_line() {
        let writer = EventWriter::new(Vec::new());

        writer
            .on_status_change(&StatusUpdate::new(SessionStatus::Running, "started"))
            .unwrap();
        writer
            .on_violation(&ViolationEvent {
                kind: ViolationType::MultipleFaces,
                active: true,
                message: "Multiple faces detected: 2".into(),
                timestamp: proctor_util::now(),
                details: ViolationDetails::with_count(2),
            })
            .unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["api_version"], API_VERSION);
        assert_eq!(lines[0]["payload"]["event"], "status");
        assert_eq!(lines[0]["payload"]["status"], "running");
        assert_eq!(lines[1]["payload"]["event"], "violation");
        assert_eq!(lines[1]["payload"]["type"], "MULTIPLE_FACES");
        assert_eq!(lines[1]["payload"]["details"]["count"], 2);
    }

    #[test]
    fn write_failure_is_reported() {
        struct Broken;

        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let writer = EventWriter::new(Broken);
        let result = writer.on_status_change(&StatusUpdate::new(SessionStatus::Stopped, "done"));
        assert!(matches!(result, Err(ProctorError::CallbackError(_))));
    }
}
