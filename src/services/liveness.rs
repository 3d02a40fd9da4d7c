//! Data liveness tracking
//!
//! Detects when the device has gone silent, which in practice means a power
//! failure or a lost network link on the incubator side.

use std::time::{Duration, Instant};

/// Default silence tolerated before warning
pub const DEFAULT_POWER_FAILURE_TIMEOUT: Duration = Duration::from_secs(15);

/// Default period between checks
pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_secs(5);

/// Tracks the arrival time of the most recent snapshot
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    timeout: Duration,
    last_seen: Option<Instant>,
}

impl LivenessMonitor {
    /// Create a monitor that flags gaps longer than `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_seen: None,
        }
    }

    /// Silence tolerated before warning
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Record that data arrived
    pub fn record(&mut self, now: Instant) {
        self.last_seen = Some(now);
    }

    /// When data last arrived
    pub fn last_seen(&self) -> Option<Instant> {
        self.last_seen
    }

    /// Time since the last arrival, if it exceeds the timeout
    ///
    /// Nothing is reported before the first arrival.
    pub fn check(&self, now: Instant) -> Option<Duration> {
        let elapsed = now.saturating_duration_since(self.last_seen?);
        (elapsed > self.timeout).then_some(elapsed)
    }
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_POWER_FAILURE_TIMEOUT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_before_first_snapshot() {
        let monitor = LivenessMonitor::default();
        let later = Instant::now() + Duration::from_secs(3600);
        assert_eq!(monitor.check(later), None);
    }

    #[test]
    fn test_stale_after_timeout() {
        let mut monitor = LivenessMonitor::new(Duration::from_secs(15));
        let start = Instant::now();
        monitor.record(start);

        assert_eq!(monitor.check(start + Duration::from_secs(10)), None);
        // Exactly at the timeout is not yet stale
        assert_eq!(monitor.check(start + Duration::from_secs(15)), None);
        assert_eq!(
            monitor.check(start + Duration::from_secs(16)),
            Some(Duration::from_secs(16))
        );
    }

    #[test]
    fn test_record_resets() {
        let mut monitor = LivenessMonitor::new(Duration::from_secs(15));
        let start = Instant::now();
        monitor.record(start);
        monitor.record(start + Duration::from_secs(20));
        assert_eq!(monitor.check(start + Duration::from_secs(25)), None);
        assert_eq!(monitor.last_seen(), Some(start + Duration::from_secs(20)));
    }
}
