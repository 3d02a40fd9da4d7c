//! Snapshot classification
//!
//! Maps a snapshot to the alerts it triggers. Rules run in a fixed order
//! (temperature, sensor fault, emergency shutdown) and are independent.

use super::types::{AlertEvent, AlertType};
use crate::domain::{DeviceSnapshot, TemperatureThresholds, TemperatureZone};
use chrono::{DateTime, Utc};

/// Status marker reported by the firmware on sensor problems
const SENSOR_MARKER: &str = "SENSOR";

/// Status marker reported by the firmware on emergency shutdown
const EMERGENCY_MARKER: &str = "EMERGENCY";

/// Stateless rule set for one device
#[derive(Debug, Clone)]
pub struct Classifier {
    device_id: String,
    thresholds: TemperatureThresholds,
}

impl Classifier {
    /// Create a classifier for a device
    pub fn new(device_id: impl Into<String>, thresholds: TemperatureThresholds) -> Self {
        Self {
            device_id: device_id.into(),
            thresholds,
        }
    }

    /// Device this classifier is bound to
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Temperature band in use
    pub fn thresholds(&self) -> &TemperatureThresholds {
        &self.thresholds
    }

    /// Evaluate every rule and return the alerts that apply, in rule order
    pub fn classify(&self, snapshot: &DeviceSnapshot, now: DateTime<Utc>) -> Vec<AlertEvent> {
        [
            self.check_temperature(snapshot),
            check_sensor_fault(snapshot),
            check_emergency_shutdown(snapshot),
        ]
        .into_iter()
        .flatten()
        .map(|(alert_type, details)| {
            AlertEvent::new(alert_type, &self.device_id, details, snapshot.clone(), now)
        })
        .collect()
    }

    fn check_temperature(&self, snapshot: &DeviceSnapshot) -> Option<(AlertType, String)> {
        let temp = snapshot.current_temp;
        match self.thresholds.zone(temp) {
            TemperatureZone::CriticalLow => Some((
                AlertType::CriticalLowTemp,
                format!(
                    "Temperature dangerously low: {:.1}°C (Critical minimum: {:?}°C)",
                    temp,
                    self.thresholds.low()
                ),
            )),
            TemperatureZone::CriticalHigh => Some((
                AlertType::CriticalHighTemp,
                format!(
                    "Temperature dangerously high: {:.1}°C (Critical maximum: {:?}°C)",
                    temp,
                    self.thresholds.high()
                ),
            )),
            TemperatureZone::Safe => None,
        }
    }
}

fn check_sensor_fault(snapshot: &DeviceSnapshot) -> Option<(AlertType, String)> {
    snapshot.status.contains(SENSOR_MARKER).then(|| {
        (
            AlertType::SensorFault,
            format!(
                "Sensor malfunction detected. System status: {}",
                snapshot.status
            ),
        )
    })
}

fn check_emergency_shutdown(snapshot: &DeviceSnapshot) -> Option<(AlertType, String)> {
    snapshot.status.contains(EMERGENCY_MARKER).then(|| {
        (
            AlertType::EmergencyShutdown,
            format!(
                "System in emergency shutdown. Status: {}",
                snapshot.status
            ),
        )
    })
}
