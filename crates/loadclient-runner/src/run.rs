//! Entry points for the two run modes.

use std::sync::Arc;

use loadclient_generator::{Clock, LineSource, LogFormat, SystemClock};
use loadclient_query::{QueryPool, QueryTarget};
use loadclient_sink::SinkConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;
use crate::error::RunError;
use crate::orchestrator::Orchestrator;
use crate::report::RunReport;
use crate::workload::{LogWorkload, QueryWorkload, Workload};

/// Everything a generate run needs.
#[derive(Debug, Clone)]
pub struct GenerateSpec {
    pub run: RunConfig,
    pub source: LineSource,
    pub format: LogFormat,
    pub sink: SinkConfig,
}

/// Everything a query run needs.
#[derive(Debug, Clone)]
pub struct QuerySpec {
    pub run: RunConfig,
    pub target: QueryTarget,
    pub pool: QueryPool,
}

/// Generate log lines into the configured sink.
pub async fn run_generate(
    spec: GenerateSpec,
    cancel: CancellationToken,
) -> Result<RunReport, RunError> {
    let orchestrator = Orchestrator::new(spec.run, cancel)?.with_unit("lines");
    tracing::info!(
        "Generating {} lines in {} format to {:?}",
        spec.source.kind().as_str(),
        spec.format.as_str(),
        spec.sink.kind()
    );

    let prepared = spec.sink.prepare().await?;
    let counters = orchestrator.counters();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    orchestrator
        .run(|identity| {
            let workload = LogWorkload::new(
                identity,
                spec.source,
                spec.format,
                Arc::clone(&clock),
                prepared.for_worker(&counters),
                StdRng::from_os_rng(),
            );
            Ok(Box::new(workload) as Box<dyn Workload>)
        })
        .await
}

/// Replay queries against the configured backend.
pub async fn run_query(spec: QuerySpec, cancel: CancellationToken) -> Result<RunReport, RunError> {
    let orchestrator = Orchestrator::new(spec.run, cancel)?.with_unit("queries");
    tracing::info!(
        "Replaying {} queries against {:?}",
        spec.pool.len(),
        spec.target.kind()
    );

    let client = spec.target.connect()?;
    let pool = Arc::new(spec.pool);

    orchestrator
        .run(|identity| {
            let workload = QueryWorkload::new(
                identity,
                Arc::clone(&pool),
                Arc::clone(&client),
                StdRng::from_os_rng(),
            );
            Ok(Box::new(workload) as Box<dyn Workload>)
        })
        .await
}
