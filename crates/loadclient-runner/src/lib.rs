//! Rate-controlled multi-worker execution engine.
//!
//! An [`Orchestrator`] spawns one tokio task per worker. Each [`Worker`]
//! asks its [`RateScheduler`] how many units to emit, performs them through
//! its [`Workload`], then sleeps until it is back on schedule. When all
//! workers are done the orchestrator waits for async sinks to settle their
//! enqueued records, closes every sink and returns a [`RunReport`].
//!
//! Cancellation is cooperative: one `CancellationToken` is observed before
//! every unit and during every pacing sleep. The drain still runs after
//! cancellation, so records already handed to a sink are accounted for.

pub mod config;
pub mod drain;
pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod report;
pub mod run;
pub mod scheduler;
pub mod worker;
pub mod workload;

pub use config::{BurstPolicy, DrainPolicy, Rate, RunConfig};
pub use error::RunError;
pub use identity::WorkerIdentity;
pub use orchestrator::Orchestrator;
pub use report::RunReport;
pub use run::{run_generate, run_query, GenerateSpec, QuerySpec};
pub use scheduler::{Plan, RateScheduler};
pub use worker::{Worker, WorkerPhase, WorkerReport, WorkerState};
pub use workload::{LogWorkload, QueryWorkload, UnitOutcome, Workload};
