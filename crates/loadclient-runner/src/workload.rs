//! Units of work a worker performs.

use std::sync::Arc;

use loadclient_generator::{Clock, LineSource, LogFormat};
use loadclient_query::{QueryClient, QueryPool};
use loadclient_sink::{Delivery, DeliveryMode, DeliveryOutcome, LineSink, LogRecord};
use rand::rngs::StdRng;

use crate::error::RunError;
use crate::identity::WorkerIdentity;

/// How one unit ended, when that is not fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Done,
    Failed,
}

/// One kind of unit: a log line or a query.
#[async_trait::async_trait]
pub trait Workload: Send {
    /// Whether results settle inline or later through the delivery counters.
    fn mode(&self) -> DeliveryMode;

    /// Perform unit `seq`. An `Err` ends the whole run.
    async fn perform(&mut self, seq: u64) -> Result<UnitOutcome, RunError>;

    async fn close(self: Box<Self>) -> Result<(), RunError>;
}

/// Produce, format and deliver log lines.
pub struct LogWorkload {
    identity: Arc<str>,
    source: LineSource,
    format: LogFormat,
    clock: Arc<dyn Clock>,
    sink: Box<dyn LineSink>,
    rng: StdRng,
}

impl LogWorkload {
    pub fn new(
        identity: &WorkerIdentity,
        source: LineSource,
        format: LogFormat,
        clock: Arc<dyn Clock>,
        sink: Box<dyn LineSink>,
        rng: StdRng,
    ) -> Self {
        Self {
            identity: identity.shared(),
            source,
            format,
            clock,
            sink,
            rng,
        }
    }
}

#[async_trait::async_trait]
impl Workload for LogWorkload {
    fn mode(&self) -> DeliveryMode {
        self.sink.mode()
    }

    async fn perform(&mut self, seq: u64) -> Result<UnitOutcome, RunError> {
        let payload = self.source.next_line(&mut self.rng);
        let line = self
            .format
            .render(self.clock.as_ref(), &self.identity, seq, &payload)?;
        let record = LogRecord {
            identity: Arc::clone(&self.identity),
            seq,
            line,
            created_at: self.clock.now(),
        };

        match self.sink.deliver(record).await {
            Ok(Delivery::Acked(DeliveryOutcome::Succeeded { .. })) | Ok(Delivery::Enqueued) => {
                Ok(UnitOutcome::Done)
            }
            Ok(Delivery::Acked(DeliveryOutcome::Failed { detail })) => Err(RunError::Rejected {
                worker: self.identity.to_string(),
                seq,
                detail,
            }),
            Err(source) => Err(RunError::Delivery {
                worker: self.identity.to_string(),
                seq,
                source,
            }),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), RunError> {
        self.sink.close().await?;
        Ok(())
    }
}

/// Replay random queries from a pool.
pub struct QueryWorkload {
    identity: Arc<str>,
    pool: Arc<QueryPool>,
    client: Arc<dyn QueryClient>,
    rng: StdRng,
}

impl QueryWorkload {
    pub fn new(
        identity: &WorkerIdentity,
        pool: Arc<QueryPool>,
        client: Arc<dyn QueryClient>,
        rng: StdRng,
    ) -> Self {
        Self {
            identity: identity.shared(),
            pool,
            client,
            rng,
        }
    }
}

#[async_trait::async_trait]
impl Workload for QueryWorkload {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Sync
    }

    async fn perform(&mut self, seq: u64) -> Result<UnitOutcome, RunError> {
        let query = self.pool.pick(&mut self.rng);
        match self.client.execute(query).await {
            Ok(outcome) => {
                tracing::info!(
                    "[{}] query {} on {}: {} results in {:?} (backend {:?})",
                    self.identity,
                    seq,
                    self.client.name(),
                    outcome.result_count,
                    outcome.elapsed,
                    outcome.backend_time
                );
                Ok(UnitOutcome::Done)
            }
            Err(e) => {
                tracing::warn!("[{}] query {} failed: {} ({})", self.identity, seq, e, query);
                Ok(UnitOutcome::Failed)
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), RunError> {
        Ok(())
    }
}
