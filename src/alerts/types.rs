//! Alert system domain types
//!
//! Defines alert types and the ephemeral alert events derived from snapshots.

use crate::domain::DeviceSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Alert classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Temperature below the critical minimum
    CriticalLowTemp,
    /// Temperature above the critical maximum
    CriticalHighTemp,
    /// Firmware reports a sensor problem
    SensorFault,
    /// Firmware has shut the incubator down
    EmergencyShutdown,
    /// No data from the device for longer than the liveness timeout
    PowerFailure,
}

impl AlertType {
    /// Label used in subjects and reports
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CriticalLowTemp => "CRITICAL LOW TEMPERATURE",
            Self::CriticalHighTemp => "CRITICAL HIGH TEMPERATURE",
            Self::SensorFault => "SENSOR FAULT",
            Self::EmergencyShutdown => "EMERGENCY SHUTDOWN",
            Self::PowerFailure => "POWER FAILURE",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A classified alert for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertEvent {
    /// What fired
    pub alert_type: AlertType,
    /// Device the snapshot came from
    pub device_id: String,
    /// Human-readable explanation
    pub details: String,
    /// Snapshot that triggered the alert
    pub snapshot: DeviceSnapshot,
    /// When the condition was detected
    pub detected_at: DateTime<Utc>,
}

impl AlertEvent {
    /// Create a new alert event
    pub fn new(
        alert_type: AlertType,
        device_id: impl Into<String>,
        details: impl Into<String>,
        snapshot: DeviceSnapshot,
        detected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            alert_type,
            device_id: device_id.into(),
            details: details.into(),
            snapshot,
            detected_at,
        }
    }

    /// Subject line for outgoing notifications
    pub fn subject(&self) -> String {
        format!(
            "🚨 CRITICAL: Incubator {} - {}",
            self.device_id,
            self.alert_type.label()
        )
    }
}
