//! Spawning, joining, draining and closing workers.
//!
//! ```text
//!   validate ─► build workloads ─► spawn N workers ─► join
//!                                                      │ first fatal error cancels the rest
//!                                                      ▼
//!                               drain async deliveries (bounded) ─► close sinks ─► report
//! ```

use std::sync::Arc;

use futures::future::join_all;
use loadclient_sink::{DeliveryCounters, DeliveryMode};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::drain::drain;
use crate::error::RunError;
use crate::identity::WorkerIdentity;
use crate::report::RunReport;
use crate::worker::{Worker, WorkerPhase, WorkerReport};
use crate::workload::Workload;

pub struct Orchestrator {
    config: Arc<RunConfig>,
    cancel: CancellationToken,
    counters: Arc<DeliveryCounters>,
    host: String,
    unit: &'static str,
}

impl Orchestrator {
    /// Validate `config` and set up shared run state.
    pub fn new(config: RunConfig, cancel: CancellationToken) -> Result<Self, RunError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            cancel,
            counters: Arc::new(DeliveryCounters::new()),
            host: WorkerIdentity::local_host(),
            unit: "units",
        })
    }

    /// Name used for one unit in reports.
    pub fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// Host name used in worker identities.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Counters every async sink of this run must report into.
    pub fn counters(&self) -> Arc<DeliveryCounters> {
        Arc::clone(&self.counters)
    }

    /// Run every worker to completion.
    ///
    /// `factory` builds one workload per worker; all are built before any
    /// worker starts, so a construction error aborts the run with nothing
    /// emitted.
    pub async fn run<F>(&self, mut factory: F) -> Result<RunReport, RunError>
    where
        F: FnMut(&WorkerIdentity) -> Result<Box<dyn Workload>, RunError>,
    {
        let mut rng = StdRng::from_os_rng();
        let mut workers = Vec::with_capacity(self.config.workers);
        for index in 0..self.config.workers {
            let identity = WorkerIdentity::generate(&self.host, index, &mut rng);
            let workload = factory(&identity)?;
            workers.push(Worker::new(
                identity,
                Arc::clone(&self.config),
                workload,
                self.cancel.clone(),
            ));
        }

        tracing::info!(
            "Starting {} workers at {} {} per {:?} each",
            self.config.workers,
            self.config.rate.units,
            self.unit,
            self.config.rate.window
        );
        let started = Instant::now();

        let mut tasks = JoinSet::new();
        for worker in workers {
            tasks.spawn(worker.run());
        }

        let mut reports: Vec<WorkerReport> = Vec::with_capacity(self.config.workers);
        let mut workloads: Vec<Box<dyn Workload>> = Vec::with_capacity(self.config.workers);
        let mut first_error: Option<RunError> = None;

        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok((workload, result)) => {
                    workloads.push(workload);
                    result
                }
                Err(e) => {
                    tracing::warn!("Worker task failed; its sink will not be closed or flushed: {}", e);
                    Err(RunError::WorkerTask(e))
                }
            };
            match result {
                Ok(report) => {
                    tracing::debug!("Worker {} finished with {} {}", report.identity, report.emitted, self.unit);
                    reports.push(report);
                }
                Err(e) => {
                    if first_error.is_none() {
                        tracing::error!("Worker failed, stopping all workers: {}", e);
                        self.cancel.cancel();
                        first_error = Some(e);
                    } else {
                        tracing::debug!("Additional worker failure: {}", e);
                    }
                }
            }
        }

        if let Some(e) = first_error {
            if let Err(close_err) = self.close_all(workloads).await {
                tracing::warn!("Failed to close sink after worker failure: {}", close_err);
            }
            return Err(e);
        }

        reports.sort_by_key(|r| r.index);
        let cancelled = self.cancel.is_cancelled();

        let async_emitted: u64 = reports
            .iter()
            .filter(|r| r.mode == DeliveryMode::Async)
            .map(|r| r.emitted)
            .sum();
        let uses_async = reports.iter().any(|r| r.mode == DeliveryMode::Async);

        let delivery = if uses_async {
            Some(drain(&self.counters, async_emitted, &self.config.drain).await?)
        } else {
            None
        };

        self.close_all(workloads).await?;
        for report in &mut reports {
            report.phase = WorkerPhase::Stopped;
        }

        Ok(RunReport {
            unit: self.unit,
            window: self.config.rate.window,
            workers: reports,
            delivery,
            elapsed: started.elapsed(),
            cancelled,
        })
    }

    /// Close every workload within the close timeout.
    ///
    /// Every workload is closed even when one fails; the first failure is
    /// returned. Hitting the timeout is logged, not fatal.
    async fn close_all(&self, workloads: Vec<Box<dyn Workload>>) -> Result<(), RunError> {
        let closing = join_all(workloads.into_iter().map(|w| w.close()));
        match tokio::time::timeout(self.config.close_timeout, closing).await {
            Ok(results) => results.into_iter().collect(),
            Err(_) => {
                tracing::warn!(
                    "Sinks did not close within {:?}",
                    self.config.close_timeout
                );
                Ok(())
            }
        }
    }
}
