//! Background batching for asynchronous sinks.
//!
//! Each async sink owns one batching task. Records arrive over a bounded
//! channel and are flushed to a [`BatchTransport`] when the pending batch
//! reaches `max_bytes` or when `max_wait` elapses, whichever comes first.
//! Retryable failures back off per [`RetryPolicy`]; once retries run out the
//! whole batch is counted as failed. Outcomes go to [`DeliveryCounters`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::counters::{DeliveryCounters, DeliveryOutcome};
use crate::error::SinkError;
use crate::retry::RetryPolicy;
use crate::{Delivery, DeliveryMode, LineSink, LogRecord};

/// Records buffered between a worker and its batching task.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;

/// Why a batch was not accepted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The backend may accept the same batch later.
    #[error("retryable: {0}")]
    Retryable(String),
    /// Retrying will not help.
    #[error("{0}")]
    Fatal(String),
}

/// Ships a batch to a backend.
#[async_trait::async_trait]
pub trait BatchTransport: Send + Sync + 'static {
    /// Short backend name for log messages.
    fn name(&self) -> &'static str;

    /// Send one batch and return one outcome per record.
    async fn send(&self, batch: &[LogRecord]) -> Result<Vec<DeliveryOutcome>, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Flush once pending line bytes reach this size.
    pub max_bytes: usize,
    /// Flush pending records at least this often.
    pub max_wait: Duration,
    pub retry: RetryPolicy,
    pub channel_capacity: usize,
}

impl BatchOptions {
    pub fn new(max_bytes: usize, max_wait: Duration) -> Self {
        Self {
            max_bytes,
            max_wait,
            retry: RetryPolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// An async [`LineSink`] backed by a batching task.
pub struct BatchingSink {
    name: &'static str,
    tx: mpsc::Sender<LogRecord>,
    task: JoinHandle<()>,
}

impl BatchingSink {
    /// Spawn the batching task on the current runtime.
    pub fn spawn<T: BatchTransport>(
        transport: T,
        options: BatchOptions,
        counters: Arc<DeliveryCounters>,
    ) -> Self {
        let name = transport.name();
        let (tx, rx) = mpsc::channel(options.channel_capacity.max(1));
        let task = tokio::spawn(run_batcher(transport, options, counters, rx));
        Self { name, tx, task }
    }
}

#[async_trait::async_trait]
impl LineSink for BatchingSink {
    fn mode(&self) -> DeliveryMode {
        DeliveryMode::Async
    }

    async fn deliver(&mut self, record: LogRecord) -> Result<Delivery, SinkError> {
        self.tx.send(record).await.map_err(|_| SinkError::Closed)?;
        Ok(Delivery::Enqueued)
    }

    async fn close(self: Box<Self>) -> Result<(), SinkError> {
        let BatchingSink { name, tx, task } = *self;
        drop(tx);
        task.await?;
        tracing::debug!("{} batching task stopped", name);
        Ok(())
    }
}

async fn run_batcher<T: BatchTransport>(
    transport: T,
    options: BatchOptions,
    counters: Arc<DeliveryCounters>,
    mut rx: mpsc::Receiver<LogRecord>,
) {
    let mut pending: Vec<LogRecord> = Vec::new();
    let mut pending_bytes = 0usize;

    let mut ticker = tokio::time::interval(options.max_wait);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(record) => {
                    pending_bytes += record.line.len();
                    pending.push(record);
                    if pending_bytes >= options.max_bytes {
                        flush(&transport, &options.retry, &counters, std::mem::take(&mut pending)).await;
                        pending_bytes = 0;
                        ticker.reset();
                    }
                }
                None => {
                    if !pending.is_empty() {
                        flush(&transport, &options.retry, &counters, pending).await;
                    }
                    break;
                }
            },
            _ = ticker.tick() => {
                if !pending.is_empty() {
                    flush(&transport, &options.retry, &counters, std::mem::take(&mut pending)).await;
                    pending_bytes = 0;
                }
            }
        }
    }
}

async fn flush<T: BatchTransport>(
    transport: &T,
    retry: &RetryPolicy,
    counters: &DeliveryCounters,
    batch: Vec<LogRecord>,
) {
    let mut attempt = 0u32;
    loop {
        match transport.send(&batch).await {
            Ok(outcomes) => {
                let mut failed = 0u64;
                for outcome in &outcomes {
                    counters.record(outcome);
                    match outcome {
                        DeliveryOutcome::Succeeded { id: Some(id) } => {
                            tracing::trace!("{} accepted document {}", transport.name(), id);
                        }
                        DeliveryOutcome::Failed { detail } => {
                            failed += 1;
                            tracing::debug!("{} rejected record: {}", transport.name(), detail);
                        }
                        DeliveryOutcome::Succeeded { id: None } => {}
                    }
                }
                // Records the backend never reported on count as failed.
                let missing = batch.len().saturating_sub(outcomes.len()) as u64;
                if missing > 0 {
                    counters.add_failed(missing);
                }
                if failed + missing > 0 {
                    tracing::warn!(
                        "{} rejected {} of {} records",
                        transport.name(),
                        failed + missing,
                        batch.len()
                    );
                }
                return;
            }
            Err(TransportError::Retryable(detail)) if retry.should_retry(attempt) => {
                attempt += 1;
                let delay = retry.delay(attempt);
                tracing::warn!(
                    "{} batch of {} records failed ({}), retry {}/{} in {:?}",
                    transport.name(),
                    batch.len(),
                    detail,
                    attempt,
                    retry.max_retries,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                tracing::warn!(
                    "{} dropped batch of {} records after {} retries: {}",
                    transport.name(),
                    batch.len(),
                    attempt,
                    err
                );
                counters.add_failed(batch.len() as u64);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    fn record(seq: u64) -> LogRecord {
        LogRecord {
            identity: Arc::from("test.0.0"),
            seq,
            line: format!("line {seq:04}\n"),
            created_at: Utc::now(),
        }
    }

    /// Accepts everything and remembers batch sizes.
    #[derive(Default, Clone)]
    struct Recording {
        batches: Arc<Mutex<Vec<usize>>>,
    }

    #[async_trait::async_trait]
    impl BatchTransport for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, batch: &[LogRecord]) -> Result<Vec<DeliveryOutcome>, TransportError> {
            self.batches.lock().unwrap().push(batch.len());
            Ok(batch
                .iter()
                .map(|r| DeliveryOutcome::Succeeded {
                    id: Some(r.seq.to_string()),
                })
                .collect())
        }
    }

    /// Fails with the given error for the first `failures` calls.
    struct Flaky {
        failures: u32,
        error: TransportError,
        calls: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl BatchTransport for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn send(&self, batch: &[LogRecord]) -> Result<Vec<DeliveryOutcome>, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(self.error.clone());
            }
            Ok(vec![DeliveryOutcome::Succeeded { id: None }; batch.len()])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_on_size() {
        let counters = Arc::new(DeliveryCounters::new());
        let transport = Recording::default();
        let batches = Arc::clone(&transport.batches);
        // Each line is 10 bytes, so every third record fills the batch.
        let options = BatchOptions::new(30, Duration::from_secs(3600));
        let mut sink = BatchingSink::spawn(transport, options, Arc::clone(&counters));

        for seq in 0..6 {
            assert_eq!(sink.deliver(record(seq)).await.unwrap(), Delivery::Enqueued);
        }
        Box::new(sink).close().await.unwrap();

        assert_eq!(*batches.lock().unwrap(), vec![3, 3]);
        assert_eq!(counters.succeeded(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_on_timer() {
        let counters = Arc::new(DeliveryCounters::new());
        let options = BatchOptions::new(1 << 20, Duration::from_secs(1));
        let mut sink = BatchingSink::spawn(Recording::default(), options, Arc::clone(&counters));

        sink.deliver(record(0)).await.unwrap();
        sink.deliver(record(1)).await.unwrap();
        assert_eq!(counters.succeeded(), 0);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(counters.succeeded(), 2);

        Box::new(sink).close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let counters = Arc::new(DeliveryCounters::new());
        let calls = Arc::new(AtomicU32::new(0));
        let transport = Flaky {
            failures: 2,
            error: TransportError::Retryable("HTTP 503".into()),
            calls: Arc::clone(&calls),
        };
        let mut sink = BatchingSink::spawn(
            transport,
            BatchOptions::new(1, Duration::from_secs(1)),
            Arc::clone(&counters),
        );

        sink.deliver(record(0)).await.unwrap();
        Box::new(sink).close().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(counters.succeeded(), 1);
        assert_eq!(counters.failed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_counts_failed() {
        let counters = Arc::new(DeliveryCounters::new());
        let calls = Arc::new(AtomicU32::new(0));
        let transport = Flaky {
            failures: u32::MAX,
            error: TransportError::Retryable("HTTP 429".into()),
            calls: Arc::clone(&calls),
        };
        let mut sink = BatchingSink::spawn(
            transport,
            BatchOptions::new(1 << 20, Duration::from_secs(1)),
            Arc::clone(&counters),
        );

        sink.deliver(record(0)).await.unwrap();
        sink.deliver(record(1)).await.unwrap();
        Box::new(sink).close().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1 + RetryPolicy::default().max_retries);
        assert_eq!(counters.failed(), 2);
        assert_eq!(counters.succeeded(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_not_retried() {
        let counters = Arc::new(DeliveryCounters::new());
        let calls = Arc::new(AtomicU32::new(0));
        let transport = Flaky {
            failures: u32::MAX,
            error: TransportError::Fatal("HTTP 400".into()),
            calls: Arc::clone(&calls),
        };
        let mut sink = BatchingSink::spawn(
            transport,
            BatchOptions::new(1, Duration::from_secs(1)),
            Arc::clone(&counters),
        );

        sink.deliver(record(0)).await.unwrap();
        Box::new(sink).close().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(counters.failed(), 1);
    }
}
