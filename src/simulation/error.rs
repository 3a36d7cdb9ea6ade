use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by the telemetry generator
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("start_time {start} must not be after end_time {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("invalid noise configuration: {0}")]
    InvalidNoiseConfig(String),

    #[error("generator self-check failed: {0}")]
    SelfCheck(String),
}

impl From<validator::ValidationErrors> for GeneratorError {
    fn from(errors: validator::ValidationErrors) -> Self {
        GeneratorError::InvalidNoiseConfig(errors.to_string())
    }
}
