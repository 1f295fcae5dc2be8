//! Background tasks that forward source samples to a session's channel

use proctor_api::{EnvironmentSignal, SourceSample};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::{FaceDetector, HostError};

/// Run face detection once per `interval` while `active` is set.
///
/// Frames that are not ready are skipped. Detection errors are logged and
/// the sample dropped. The task ends when the receiver is dropped.
pub fn spawn_face_sampler(
    detector: Arc<dyn FaceDetector>,
    interval: Duration,
    active: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<SourceSample>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            timer.tick().await;

            if tx.is_closed() {
                debug!("Face sampler receiver closed");
                break;
            }
            if !active.load(Ordering::SeqCst) || !detector.is_ready() {
                continue;
            }

            match detector.detect().await {
                Ok(count) => {
                    trace!(faces = count, "Face sample");
                    if tx.send(SourceSample::Faces(count)).is_err() {
                        break;
                    }
                }
                Err(HostError::NotReady) => {}
                Err(e) => {
                    warn!(error = %e, "Face detection failed, skipping sample");
                }
            }
        }
    })
}

/// Forward environment signals until either side closes
pub fn spawn_environment_forwarder(
    mut signals: mpsc::UnboundedReceiver<EnvironmentSignal>,
    tx: mpsc::UnboundedSender<SourceSample>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            if tx.send(SourceSample::Environment(signal)).is_err() {
                break;
            }
        }
        debug!("Environment forwarder finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnvironmentMonitor, MockDetector, MockEnvironment};

    #[tokio::test]
    async fn face_sampler_forwards_counts() {
        let detector = Arc::new(MockDetector::with_samples([0, 2]));
        let active = Arc::new(AtomicBool::new(true));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_face_sampler(detector, Duration::from_millis(1), active, tx);

        assert_eq!(rx.recv().await, Some(SourceSample::Faces(0)));
        assert_eq!(rx.recv().await, Some(SourceSample::Faces(2)));
        handle.abort();
    }

    #[tokio::test]
    async fn face_sampler_skips_failures() {
        let detector = Arc::new(MockDetector::with_samples([3]));
        *detector.fail_detect.lock().unwrap() = true;
        let active = Arc::new(AtomicBool::new(true));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_face_sampler(detector.clone(), Duration::from_millis(1), active, tx);

        while detector.calls() < 3 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert!(rx.try_recv().is_err());

        *detector.fail_detect.lock().unwrap() = false;
        assert_eq!(rx.recv().await, Some(SourceSample::Faces(3)));
        handle.abort();
    }

    #[tokio::test]
    async fn face_sampler_idles_while_inactive() {
        let detector = Arc::new(MockDetector::new());
        let active = Arc::new(AtomicBool::new(false));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = spawn_face_sampler(detector.clone(), Duration::from_millis(1), active.clone(), tx);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(detector.calls(), 0);

        active.store(true, Ordering::SeqCst);
        assert_eq!(rx.recv().await, Some(SourceSample::Faces(1)));
        handle.abort();
    }

    #[tokio::test]
    async fn face_sampler_stops_when_receiver_dropped() {
        let detector = Arc::new(MockDetector::new());
        let active = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let handle = spawn_face_sampler(detector, Duration::from_millis(1), active, tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn environment_forwarder_wraps_signals() {
        let env = MockEnvironment::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_environment_forwarder(env.subscribe(), tx);

        env.emit(EnvironmentSignal::Fullscreen { active: false });

        assert_eq!(
            rx.recv().await,
            Some(SourceSample::Environment(EnvironmentSignal::Fullscreen {
                active: false
            }))
        );

        drop(env);
        handle.await.unwrap();
    }
}
