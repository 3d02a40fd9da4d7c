//! Per-alert cooldown tracking
//!
//! Suppresses repeat notifications of the same alert type for the same device
//! within a fixed window. State lives only for the process lifetime.

use super::types::AlertType;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// Default window between notifications of the same alert
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Cooldown gate keyed by alert type and device
#[derive(Debug, Clone)]
pub struct CooldownGate {
    window: Duration,
    last_fired: HashMap<(AlertType, String), DateTime<Utc>>,
}

impl CooldownGate {
    /// Create a gate with the given window
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: HashMap::new(),
        }
    }

    /// Window shared by all alert types
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether an alert may be sent now
    pub fn should_fire(&self, alert_type: AlertType, device_id: &str, now: DateTime<Utc>) -> bool {
        self.remaining(alert_type, device_id, now).is_none()
    }

    /// Time left in the window, `None` when the alert may fire
    pub fn remaining(
        &self,
        alert_type: AlertType,
        device_id: &str,
        now: DateTime<Utc>,
    ) -> Option<Duration> {
        let last = self.last_fired.get(&(alert_type, device_id.to_string()))?;
        // A clock that went backwards counts as zero elapsed
        let elapsed = (now - *last).to_std().unwrap_or(Duration::ZERO);
        self.window.checked_sub(elapsed).filter(|left| !left.is_zero())
    }

    /// Record a successful send
    pub fn record(&mut self, alert_type: AlertType, device_id: &str, now: DateTime<Utc>) {
        self.last_fired
            .insert((alert_type, device_id.to_string()), now);
    }

    /// Last successful send for a key
    pub fn last_fired(&self, alert_type: AlertType, device_id: &str) -> Option<DateTime<Utc>> {
        self.last_fired
            .get(&(alert_type, device_id.to_string()))
            .copied()
    }

    /// Forget all recorded sends
    pub fn clear(&mut self) {
        self.last_fired.clear();
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
