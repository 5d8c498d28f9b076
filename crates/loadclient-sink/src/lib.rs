//! Destinations for generated log lines.
//!
//! Every destination implements [`LineSink`]. Synchronous sinks (stdout, file)
//! report the outcome of each record inline. Asynchronous sinks (Loki push,
//! Elasticsearch bulk) hand records to a background batching task and report
//! outcomes later through the shared [`DeliveryCounters`]:
//!
//! ```text
//!   worker ──deliver──► StdoutSink / FileSink ──► Delivery::Acked(outcome)
//!
//!   worker ──deliver──► BatchingSink ──mpsc──► batch task ──HTTP──► backend
//!                          │                       │
//!                          ▼                       ▼
//!                  Delivery::Enqueued      DeliveryCounters (+succeeded / +failed)
//! ```
//!
//! A [`SinkConfig`] is prepared once per run ([`SinkConfig::prepare`]); the
//! resulting [`PreparedSink`] then builds one sink per worker.

pub mod batch;
pub mod config;
pub mod console;
pub mod counters;
pub mod elasticsearch;
pub mod error;
pub mod file;
pub mod http;
pub mod loki;
pub mod retry;

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use batch::{BatchOptions, BatchTransport, BatchingSink, TransportError};
pub use config::{PreparedSink, SinkConfig, SinkKind};
pub use counters::{CountersSnapshot, DeliveryCounters, DeliveryOutcome};
pub use elasticsearch::ElasticsearchConfig;
pub use error::{HttpSetupError, SinkError};
pub use http::HttpOptions;
pub use loki::{LokiConfig, LokiLabels};
pub use retry::RetryPolicy;

/// One rendered line together with the metadata backends index it by.
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// Identity of the worker that produced the line.
    pub identity: Arc<str>,
    /// Per-worker sequence number.
    pub seq: u64,
    /// Rendered line, including its trailing newline.
    pub line: String,
    pub created_at: DateTime<Utc>,
}

impl LogRecord {
    /// The line without its trailing newline.
    pub fn body(&self) -> &str {
        self.line.trim_end_matches('\n')
    }
}

/// How a sink reports delivery results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Sync,
    Async,
}

/// What `deliver` knows when it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The sink finished with the record.
    Acked(DeliveryOutcome),
    /// The record was queued; its outcome lands in [`DeliveryCounters`].
    Enqueued,
}

/// A destination for log records, owned by one worker.
#[async_trait::async_trait]
pub trait LineSink: Send {
    fn mode(&self) -> DeliveryMode;

    /// Deliver one record.
    ///
    /// An `Err` means the sink cannot accept further records and is fatal for
    /// the run. Backend rejections of async records never surface here.
    async fn deliver(&mut self, record: LogRecord) -> Result<Delivery, SinkError>;

    /// Flush buffered records and release resources.
    async fn close(self: Box<Self>) -> Result<(), SinkError>;
}
