//! Error types for SpeedLog core

use thiserror::Error;

/// Errors that can occur in SpeedLog core
#[derive(Debug, Error)]
pub enum SpeedLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Traffic counters unavailable: {0}")]
    Counters(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Action not supported by this bridge: {0}")]
    Unsupported(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

impl SpeedLogError {
    /// Check if this error only affects the current tick
    pub fn is_transient(&self) -> bool {
        matches!(self, SpeedLogError::Io(_) | SpeedLogError::Counters(_))
    }
}

// Allow converting to String for bridge callers
impl From<SpeedLogError> for String {
    fn from(error: SpeedLogError) -> Self {
        error.to_string()
    }
}

impl From<serde_json::Error> for SpeedLogError {
    fn from(error: serde_json::Error) -> Self {
        SpeedLogError::Serialization(error.to_string())
    }
}
