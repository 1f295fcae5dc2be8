//! Signal source traits

use async_trait::async_trait;
use proctor_api::{EnvironmentSignal, EnvironmentSnapshot};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::HostCapabilities;

/// Errors from signal sources
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Camera feed not ready")]
    NotReady,

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Unsupported signal: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Face detector - wraps whatever model counts faces in the camera feed
#[async_trait]
pub trait FaceDetector: Send + Sync {
    /// Whether a frame is available for detection
    fn is_ready(&self) -> bool;

    /// Count faces in the current frame
    async fn detect(&self) -> HostResult<usize>;
}

/// Environment monitor - fullscreen, visibility, clipboard and screen signals
pub trait EnvironmentMonitor: Send + Sync {
    /// Get the capabilities of this host
    fn capabilities(&self) -> &HostCapabilities;

    /// Sample the current environment state
    fn snapshot(&self) -> EnvironmentSnapshot;

    /// Subscribe to environment changes
    fn subscribe(&self) -> mpsc::UnboundedReceiver<EnvironmentSignal>;
}
