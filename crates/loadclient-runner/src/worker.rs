//! A single rate-controlled worker.

use std::sync::Arc;
use std::time::Duration;

use loadclient_sink::DeliveryMode;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::error::RunError;
use crate::identity::WorkerIdentity;
use crate::scheduler::{Plan, RateScheduler};
use crate::workload::{UnitOutcome, Workload};

/// Lifecycle of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Initializing,
    Running,
    /// Done emitting; async deliveries may still be in flight.
    Draining,
    Stopped,
}

/// Counters owned and mutated only by their worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerState {
    /// Units performed so far; also the next sequence number.
    pub emitted: u64,
    /// Units that completed with a non-fatal failure.
    pub failed: u64,
    /// Sub-bursts completed.
    pub bursts: u64,
}

/// What a worker did.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub identity: String,
    pub index: usize,
    pub mode: DeliveryMode,
    pub emitted: u64,
    pub failed: u64,
    pub bursts: u64,
    pub elapsed: Duration,
    pub phase: WorkerPhase,
}

pub struct Worker {
    identity: WorkerIdentity,
    config: Arc<RunConfig>,
    workload: Box<dyn Workload>,
    cancel: CancellationToken,
    phase: WorkerPhase,
    state: WorkerState,
}

impl Worker {
    pub fn new(
        identity: WorkerIdentity,
        config: Arc<RunConfig>,
        workload: Box<dyn Workload>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            identity,
            config,
            workload,
            cancel,
            phase: WorkerPhase::Idle,
            state: WorkerState::default(),
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    fn transition(&mut self, next: WorkerPhase) {
        tracing::debug!(
            "Worker {} {:?} -> {:?} ({} units)",
            self.identity,
            self.phase,
            next,
            self.state.emitted
        );
        self.phase = next;
    }

    /// Run until the ceiling is reached, the token is cancelled, or a unit
    /// fails fatally. The workload is handed back so its sink can be closed
    /// once the run has drained.
    pub async fn run(mut self) -> (Box<dyn Workload>, Result<WorkerReport, RunError>) {
        self.transition(WorkerPhase::Initializing);
        let started = Instant::now();
        let scheduler = RateScheduler::new(&self.config, started);
        tracing::debug!(
            "Worker {} pacing {} units per {:?} in {} sub-bursts",
            self.identity,
            self.config.rate.units,
            self.config.rate.window,
            scheduler.bursts_per_window()
        );

        self.transition(WorkerPhase::Running);
        let outcome = self.run_loop(&scheduler).await;

        let mode = self.workload.mode();
        self.transition(match mode {
            DeliveryMode::Async => WorkerPhase::Draining,
            DeliveryMode::Sync => WorkerPhase::Stopped,
        });

        let report = WorkerReport {
            identity: self.identity.to_string(),
            index: self.identity.index(),
            mode,
            emitted: self.state.emitted,
            failed: self.state.failed,
            bursts: self.state.bursts,
            elapsed: started.elapsed(),
            phase: self.phase,
        };
        (self.workload, outcome.map(|()| report))
    }

    async fn run_loop(&mut self, scheduler: &RateScheduler) -> Result<(), RunError> {
        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            let n = match scheduler.plan(self.state.emitted) {
                Plan::Stop => return Ok(()),
                Plan::Burst(n) => n,
            };

            for _ in 0..n {
                if self.cancel.is_cancelled() {
                    return Ok(());
                }
                let seq = self.state.emitted;
                if self.workload.perform(seq).await? == UnitOutcome::Failed {
                    self.state.failed += 1;
                }
                self.state.emitted += 1;
            }
            self.state.bursts += 1;

            if scheduler.is_complete(self.state.emitted) {
                return Ok(());
            }
            if !scheduler.pace(self.state.emitted, &self.cancel).await {
                return Ok(());
            }
        }
    }
}
