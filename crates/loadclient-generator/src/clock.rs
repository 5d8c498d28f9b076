//! Wall-clock access for formatters.

use chrono::{DateTime, SecondsFormat, Utc};

/// Source of the timestamp embedded in rendered lines.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Current time as RFC 3339 with nanosecond precision.
    fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// A clock frozen at the Unix epoch.
    pub fn epoch() -> Self {
        Self(DateTime::UNIX_EPOCH)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_timestamp() {
        let clock = FixedClock::epoch();
        assert_eq!(clock.timestamp(), "1970-01-01T00:00:00.000000000Z");
    }
}
