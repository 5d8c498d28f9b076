//! Run configuration shared read-only by every worker.

use std::time::Duration;

use crate::error::RunError;

/// Rates above this are split into several sub-bursts per window.
pub const DEFAULT_BURST_THRESHOLD: u64 = 100;

/// Sub-bursts per window for rates above the threshold.
pub const DEFAULT_BURSTS: u64 = 10;

pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

pub const DEFAULT_DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Units per window for a single worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    pub units: u64,
    pub window: Duration,
}

impl Rate {
    pub fn per_second(units: u64) -> Self {
        Self {
            units,
            window: Duration::from_secs(1),
        }
    }

    pub fn per_minute(units: u64) -> Self {
        Self {
            units,
            window: Duration::from_secs(60),
        }
    }
}

/// How a window's units are split into sub-bursts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstPolicy {
    /// Rates strictly above this use `bursts` sub-bursts; others use one.
    pub threshold: u64,
    pub bursts: u64,
}

impl Default for BurstPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_BURST_THRESHOLD,
            bursts: DEFAULT_BURSTS,
        }
    }
}

impl BurstPolicy {
    /// Sub-bursts per window at `rate`.
    pub fn bursts_for(&self, rate: u64) -> u64 {
        if rate > self.threshold {
            self.bursts
        } else {
            1
        }
    }
}

/// How long to wait for async sinks to settle enqueued records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_DRAIN_TIMEOUT,
            poll_interval: DEFAULT_DRAIN_POLL_INTERVAL,
        }
    }
}

/// Configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Per-worker rate.
    pub rate: Rate,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Per-worker ceiling; 0 runs until cancelled.
    pub total_units: u64,
    pub burst: BurstPolicy,
    pub drain: DrainPolicy,
    /// Bound on closing all sinks after a successful drain.
    pub close_timeout: Duration,
}

impl RunConfig {
    pub fn new(rate: Rate, workers: usize) -> Self {
        Self {
            rate,
            workers,
            total_units: 0,
            burst: BurstPolicy::default(),
            drain: DrainPolicy::default(),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    /// Stop each worker after `total` units (0 = unbounded).
    pub fn with_total_units(mut self, total: u64) -> Self {
        self.total_units = total;
        self
    }

    pub fn with_burst(mut self, burst: BurstPolicy) -> Self {
        self.burst = burst;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain.timeout = timeout;
        self
    }

    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.rate.units == 0 {
            return Err(RunError::Config("rate must be greater than 0".into()));
        }
        if self.rate.window.is_zero() {
            return Err(RunError::Config("rate window must be non-zero".into()));
        }
        if self.workers == 0 {
            return Err(RunError::Config("at least one worker is required".into()));
        }
        if self.burst.bursts == 0 {
            return Err(RunError::Config("burst count must be greater than 0".into()));
        }
        if self.drain.timeout.is_zero() {
            return Err(RunError::Config("drain timeout must be non-zero".into()));
        }
        if self.drain.poll_interval.is_zero() {
            return Err(RunError::Config("drain poll interval must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::new(Rate::per_second(500), 4);
        assert_eq!(config.total_units, 0);
        assert_eq!(config.burst.threshold, 100);
        assert_eq!(config.burst.bursts, 10);
        assert_eq!(config.drain.timeout, Duration::from_secs(60));
        assert_eq!(config.drain.poll_interval, Duration::from_millis(100));
        assert_eq!(config.close_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bursts_for_rate() {
        let burst = BurstPolicy::default();
        assert_eq!(burst.bursts_for(100), 1);
        assert_eq!(burst.bursts_for(101), 10);
        assert_eq!(burst.bursts_for(5), 1);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(RunConfig::new(Rate::per_second(0), 1).validate().is_err());
        assert!(RunConfig::new(Rate::per_second(1), 0).validate().is_err());

        let config = RunConfig::new(Rate::per_minute(10), 1).with_burst(BurstPolicy {
            threshold: 100,
            bursts: 0,
        });
        assert!(matches!(config.validate(), Err(RunError::Config(_))));

        let config = RunConfig::new(Rate::per_second(1), 1).with_drain_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
