//! Error types for proctor

use thiserror::Error;

/// Core error type for proctor operations
#[derive(Debug, Error)]
pub enum ProctorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Callback error: {0}")]
    CallbackError(String),

    #[error("Session already running")]
    SessionAlreadyRunning,

    #[error("Session has been destroyed")]
    SessionDestroyed,

    #[error("Signal source error: {0}")]
    SourceError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProctorError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn callback(msg: impl Into<String>) -> Self {
        Self::CallbackError(msg.into())
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ProctorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            ProctorError::config("negative throttle").to_string(),
            "Configuration error: negative throttle"
        );
        assert_eq!(
            ProctorError::callback("boom").to_string(),
            "Callback error: boom"
        );
        assert_eq!(
            ProctorError::SessionAlreadyRunning.to_string(),
            "Session already running"
        );
    }
}
