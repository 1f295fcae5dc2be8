//! Replay host: signal sources fed from NDJSON records
//!
//! Each line is one record:
//!
//! ```text
//! {"kind":"faces","count":2}
//! {"kind":"visibility","hidden":true}
//! {"kind":"fullscreen","active":false}
//! {"kind":"clipboard","action":"paste"}
//! {"kind":"screens","extended":true}
//! ```
//!
//! Every `faces` record is one camera frame and is handed to exactly one
//! detection pass. Blank lines and lines starting with `#` are skipped.

use anyhow::Result;
use async_trait::async_trait;
use proctor_api::{ClipboardAction, EnvironmentSignal, EnvironmentSnapshot};
use proctor_host_api::{
    EnvironmentMonitor, FaceDetector, HostCapabilities, HostError, HostResult,
};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplayRecord {
    Faces {
        count: usize,
    },
    Fullscreen {
        active: bool,
    },
    Visibility {
        hidden: bool,
    },
    Clipboard {
        action: ClipboardAction,
    },
    Screens {
        #[serde(default)]
        extended: Option<bool>,
    },
}

pub struct ReplayHost {
    capabilities: HostCapabilities,
    faces: Mutex<VecDeque<usize>>,
    snapshot: Mutex<EnvironmentSnapshot>,
    env_tx: Mutex<Option<mpsc::UnboundedSender<EnvironmentSignal>>>,
    env_rx: Mutex<Option<mpsc::UnboundedReceiver<EnvironmentSignal>>>,
    finished: AtomicBool,
}

impl ReplayHost {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            capabilities: HostCapabilities::full(),
            faces: Mutex::new(VecDeque::new()),
            snapshot: Mutex::new(EnvironmentSnapshot::default()),
            env_tx: Mutex::new(Some(tx)),
            env_rx: Mutex::new(Some(rx)),
            finished: AtomicBool::new(false),
        }
    }

    /// Read records from `input` until EOF.
    ///
    /// Resolves to the number of records accepted. Malformed lines are
    /// logged and skipped.
    pub fn spawn_reader<R>(self: &Arc<Self>, input: R) -> JoinHandle<Result<usize>>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let host = self.clone();
        tokio::spawn(async move {
            let result = host.read_all(input).await;
            host.finish();
            result
        })
    }

    async fn read_all<R>(&self, input: R) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut line_no = 0usize;
        let mut accepted = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_no += 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match serde_json::from_str::<ReplayRecord>(line) {
                Ok(record) => {
                    self.push(record);
                    accepted += 1;
                }
                Err(e) => {
                    warn!(line = line_no, error = %e, "Skipping malformed replay record");
                }
            }
        }

        info!(records = accepted, lines = line_no, "Replay input exhausted");
        Ok(accepted)
    }

    fn push(&self, record: ReplayRecord) {
        let signal = match record {
            ReplayRecord::Faces { count } => {
                self.faces
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push_back(count);
                return;
            }
            ReplayRecord::Fullscreen { active } => EnvironmentSignal::Fullscreen { active },
            ReplayRecord::Visibility { hidden } => EnvironmentSignal::Visibility { hidden },
            ReplayRecord::Clipboard { action } => EnvironmentSignal::Clipboard { action },
            ReplayRecord::Screens { extended } => EnvironmentSignal::Screens { extended },
        };

        {
            let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            match signal {
                EnvironmentSignal::Fullscreen { active } => snapshot.fullscreen = active,
                EnvironmentSignal::Visibility { hidden } => snapshot.hidden = hidden,
                EnvironmentSignal::Screens { extended } => snapshot.screens_extended = extended,
                EnvironmentSignal::Clipboard { .. } => {}
            }
        }

        if let Some(tx) = self
            .env_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            && tx.send(signal).is_err()
        {
            debug!(?signal, "No environment subscriber, signal dropped");
        }
    }

    fn finish(&self) {
        // Closing the sender ends the subscriber's stream once drained
        self.env_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.finished.store(true, Ordering::SeqCst);
    }

    /// True once the input has been read to the end
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Face frames not yet handed to a detection pass
    pub fn pending_faces(&self) -> usize {
        self.faces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for ReplayHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FaceDetector for ReplayHost {
    fn is_ready(&self) -> bool {
        self.pending_faces() > 0
    }

    async fn detect(&self) -> HostResult<usize> {
        self.faces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or(HostError::NotReady)
    }
}

impl EnvironmentMonitor for ReplayHost {
    fn capabilities(&self) -> &HostCapabilities {
        &self.capabilities
    }

    fn snapshot(&self) -> EnvironmentSnapshot {
        *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<EnvironmentSignal> {
        match self
            .env_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            Some(rx) => rx,
            None => {
                warn!("Replay environment already subscribed, returning a closed stream");
                mpsc::unbounded_channel().1
            }
        }
    }
}
