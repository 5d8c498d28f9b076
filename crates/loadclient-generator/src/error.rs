//! Error types for log content generation.

use thiserror::Error;

/// Errors that can occur while producing or rendering a log line.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// A synthetic source was configured without a payload.
    #[error("Invalid synthetic payload size: {0}")]
    InvalidPayloadSize(usize),

    /// JSON rendering failed.
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}
