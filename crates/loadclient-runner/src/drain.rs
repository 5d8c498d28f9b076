//! Waiting for async sinks to settle enqueued records.

use loadclient_sink::{CountersSnapshot, DeliveryCounters};
use tokio::time::Instant;

use crate::config::DrainPolicy;
use crate::error::RunError;

/// Poll `counters` until `expected` records have settled (succeeded or
/// failed) or the policy's timeout elapses.
pub async fn drain(
    counters: &DeliveryCounters,
    expected: u64,
    policy: &DrainPolicy,
) -> Result<CountersSnapshot, RunError> {
    let started = Instant::now();
    let deadline = started + policy.timeout;
    tracing::info!("Waiting for {} enqueued records to be delivered", expected);

    loop {
        let snapshot = counters.snapshot();
        if snapshot.settled() >= expected {
            tracing::info!(
                "Drained in {:?}: {} succeeded, {} failed",
                started.elapsed(),
                snapshot.succeeded,
                snapshot.failed
            );
            return Ok(snapshot);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(RunError::DrainTimeout {
                timeout: policy.timeout,
                settled: snapshot.settled(),
                expected,
            });
        }

        tracing::trace!("{} of {} records settled", snapshot.settled(), expected);
        tokio::time::sleep(policy.poll_interval.min(deadline - now)).await;
    }
}
