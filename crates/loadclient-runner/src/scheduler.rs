//! Burst planning and pacing.
//!
//! A window of `rate` units is split into `B` sub-bursts (`B` from
//! [`BurstPolicy::bursts_for`]). Sub-burst `k` carries `rate / B` units plus
//! one extra for the first `rate % B` sub-bursts, so each window emits
//! exactly `rate` units:
//!
//! ```text
//!   rate = 1005, B = 10
//!   window: [101][101][101][101][101][100][100][100][100][100]
//!            ^ t0  ^ t0 + 0.1005 * window ...
//! ```
//!
//! After every sub-burst the worker waits until
//! `start + window * emitted / rate`. A worker that has fallen behind proceeds
//! at once; nothing divides by elapsed time.
//!
//! [`BurstPolicy::bursts_for`]: crate::config::BurstPolicy::bursts_for

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::RunConfig;

/// What a worker does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// The ceiling is reached.
    Stop,
    /// Emit this many units, then pace.
    Burst(u64),
}

#[derive(Debug, Clone)]
pub struct RateScheduler {
    rate: u64,
    window: Duration,
    bursts: u64,
    total_units: u64,
    start: Instant,
}

impl RateScheduler {
    pub fn new(config: &RunConfig, start: Instant) -> Self {
        let rate = config.rate.units.max(1);
        Self {
            rate,
            window: config.rate.window,
            bursts: config.burst.bursts_for(rate).clamp(1, rate),
            total_units: config.total_units,
            start,
        }
    }

    pub fn bursts_per_window(&self) -> u64 {
        self.bursts
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// True once the ceiling (if any) is reached.
    pub fn is_complete(&self, emitted: u64) -> bool {
        self.total_units > 0 && emitted >= self.total_units
    }

    /// Size of the sub-burst that starts at `emitted`.
    pub fn plan(&self, emitted: u64) -> Plan {
        if self.is_complete(emitted) {
            return Plan::Stop;
        }

        let position = emitted % self.rate;
        let base = self.rate / self.bursts;
        let extra = self.rate % self.bursts;

        let mut end = 0;
        for k in 0..self.bursts {
            end += base + u64::from(k < extra);
            if end > position {
                break;
            }
        }
        let mut n = end - position;

        if self.total_units > 0 {
            n = n.min(self.total_units - emitted);
        }
        Plan::Burst(n)
    }

    /// Earliest instant at which `emitted` units are on schedule.
    pub fn deadline(&self, emitted: u64) -> Instant {
        let nanos = self.window.as_nanos() * u128::from(emitted) / u128::from(self.rate);
        let offset = Duration::new(
            (nanos / 1_000_000_000).min(u128::from(u64::MAX)) as u64,
            (nanos % 1_000_000_000) as u32,
        );
        self.start + offset
    }

    /// How long to wait at `now` after `emitted` units; `None` when behind.
    pub fn pause_after(&self, emitted: u64, now: Instant) -> Option<Duration> {
        let deadline = self.deadline(emitted);
        (deadline > now).then(|| deadline - now)
    }

    /// Sleep until `emitted` units are on schedule.
    ///
    /// Returns `false` if `cancel` fired first.
    pub async fn pace(&self, emitted: u64, cancel: &CancellationToken) -> bool {
        if self.pause_after(emitted, Instant::now()).is_none() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep_until(self.deadline(emitted)) => true,
        }
    }
}
