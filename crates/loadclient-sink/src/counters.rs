//! Delivery accounting shared between async sinks and the orchestrator.

use std::sync::atomic::{AtomicU64, Ordering};

/// Result of delivering one log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The backend accepted the record, optionally returning its document id.
    Succeeded { id: Option<String> },
    /// The backend rejected the record.
    Failed { detail: String },
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Succeeded { .. })
    }
}

/// Success/failure tallies reported by async sinks.
///
/// One instance is created per run and handed to every sink, so the drain
/// loop can compare the settled total against the number of enqueued records.
#[derive(Debug, Default)]
pub struct DeliveryCounters {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`DeliveryCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub succeeded: u64,
    pub failed: u64,
}

impl CountersSnapshot {
    pub fn settled(&self) -> u64 {
        self.succeeded + self.failed
    }
}

impl DeliveryCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Succeeded { .. } => self.add_succeeded(1),
            DeliveryOutcome::Failed { .. } => self.add_failed(1),
        }
    }

    pub fn add_succeeded(&self, n: u64) {
        self.succeeded.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_failed(&self, n: u64) {
        self.failed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            succeeded: self.succeeded(),
            failed: self.failed(),
        }
    }
}
