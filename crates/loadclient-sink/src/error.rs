//! Error types for line sinks.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building an HTTP client.
#[derive(Error, Debug)]
pub enum HttpSetupError {
    #[error("Failed to read {what} from {path}: {source}")]
    ReadFile {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid bearer token in {0}")]
    InvalidToken(PathBuf),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors that can occur while preparing or using a sink.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to open output file {path}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    HttpSetup(#[from] HttpSetupError),

    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} returned HTTP {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Invalid sink configuration: {0}")]
    Config(String),

    #[error("Sink is closed")]
    Closed,

    #[error("Shared output writer is poisoned")]
    Poisoned,

    #[error("Background batching task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
