//! Error types for a load run.

use std::time::Duration;

use loadclient_generator::GeneratorError;
use loadclient_query::QueryError;
use loadclient_sink::SinkError;
use thiserror::Error;

/// Errors that end a run.
#[derive(Error, Debug)]
pub enum RunError {
    /// The run configuration is unusable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rendering a line failed.
    #[error("Line generation failed: {0}")]
    Generator(#[from] GeneratorError),

    /// Setting up or closing a sink failed.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Setting up a query client failed.
    #[error("Query setup error: {0}")]
    Query(#[from] QueryError),

    /// A synchronous sink could not take a record.
    #[error("Worker {worker} failed to deliver line {seq}: {source}")]
    Delivery {
        worker: String,
        seq: u64,
        #[source]
        source: SinkError,
    },

    /// A synchronous sink rejected a record.
    #[error("Worker {worker} had line {seq} rejected: {detail}")]
    Rejected {
        worker: String,
        seq: u64,
        detail: String,
    },

    /// Async sinks did not settle every enqueued record in time.
    #[error(
        "Timed out after {timeout:?} waiting for delivery: {settled} of {expected} records settled"
    )]
    DrainTimeout {
        timeout: Duration,
        settled: u64,
        expected: u64,
    },

    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    WorkerTask(#[from] tokio::task::JoinError),
}
