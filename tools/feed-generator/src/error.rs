//! Generator error type

use thiserror::Error;
use types::errors::{ConfigError, InvariantViolation};

/// Any failure that aborts a generation run.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal fault: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GeneratorError {
    /// True when nothing was written because the configuration was rejected.
    pub fn is_config(&self) -> bool {
        matches!(self, GeneratorError::Config(_))
    }
}
