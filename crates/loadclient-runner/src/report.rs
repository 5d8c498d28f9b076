//! Run summary.

use std::time::Duration;

use loadclient_sink::CountersSnapshot;

use crate::worker::WorkerReport;

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// What one unit is ("lines", "queries").
    pub unit: &'static str,
    /// Rate window the achieved rate is expressed in.
    pub window: Duration,
    pub workers: Vec<WorkerReport>,
    /// Async delivery results, when an async sink was used.
    pub delivery: Option<CountersSnapshot>,
    pub elapsed: Duration,
    /// The run ended on cancellation rather than on its ceiling.
    pub cancelled: bool,
}

impl RunReport {
    pub fn total_emitted(&self) -> u64 {
        self.workers.iter().map(|w| w.emitted).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.workers.iter().map(|w| w.failed).sum()
    }

    /// Units per window across all workers.
    pub fn achieved_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.total_emitted() as f64 / secs * self.window.as_secs_f64()
    }

    pub fn summary(&self) -> String {
        let window = if self.window == Duration::from_secs(60) {
            "min".to_string()
        } else if self.window == Duration::from_secs(1) {
            "s".to_string()
        } else {
            format!("{:?}", self.window)
        };

        let mut summary = format!(
            "Run {}: {} {} from {} workers in {:.2?} ({:.1} {}/{})\n",
            if self.cancelled { "cancelled" } else { "complete" },
            self.total_emitted(),
            self.unit,
            self.workers.len(),
            self.elapsed,
            self.achieved_rate(),
            self.unit,
            window
        );

        if self.total_failed() > 0 {
            summary.push_str(&format!("- Failed {}: {}\n", self.unit, self.total_failed()));
        }
        if let Some(delivery) = &self.delivery {
            summary.push_str(&format!(
                "- Delivered: {} succeeded, {} failed\n",
                delivery.succeeded, delivery.failed
            ));
        }
        for worker in &self.workers {
            summary.push_str(&format!(
                "- {}: {} {} in {} bursts\n",
                worker.identity, worker.emitted, self.unit, worker.bursts
            ));
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::WorkerPhase;
    use loadclient_sink::DeliveryMode;

    fn worker(index: usize, emitted: u64, failed: u64) -> WorkerReport {
        WorkerReport {
            identity: format!("h.{index}.0"),
            index,
            mode: DeliveryMode::Async,
            emitted,
            failed,
            bursts: 1,
            elapsed: Duration::from_secs(2),
            phase: WorkerPhase::Stopped,
        }
    }

    #[test]
    fn test_totals_and_rate() {
        let report = RunReport {
            unit: "lines",
            window: Duration::from_secs(1),
            workers: vec![worker(0, 100, 0), worker(1, 100, 2)],
            delivery: Some(CountersSnapshot {
                succeeded: 195,
                failed: 5,
            }),
            elapsed: Duration::from_secs(2),
            cancelled: false,
        };
        assert_eq!(report.total_emitted(), 200);
        assert_eq!(report.total_failed(), 2);
        assert!((report.achieved_rate() - 100.0).abs() < f64::EPSILON);

        let summary = report.summary();
        assert!(summary.starts_with("Run complete: 200 lines from 2 workers"));
        assert!(summary.contains("100.0 lines/s"));
        assert!(summary.contains("- Delivered: 195 succeeded, 5 failed"));
        assert!(summary.contains("- h.1.0: 100 lines in 1 bursts"));
    }

    #[test]
    fn test_per_minute_rate() {
        let report = RunReport {
            unit: "queries",
            window: Duration::from_secs(60),
            workers: vec![worker(0, 30, 0)],
            delivery: None,
            elapsed: Duration::from_secs(30),
            cancelled: true,
        };
        assert!((report.achieved_rate() - 60.0).abs() < 1e-9);
        assert!(report.summary().contains("60.0 queries/min"));
        assert!(report.summary().starts_with("Run cancelled"));
    }
}
