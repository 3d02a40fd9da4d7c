//! Alert manager implementation
//!
//! Classifies snapshots, applies the cooldown gate and triggers notifications.

use super::classifier::Classifier;
use super::cooldown::CooldownGate;
use super::notifier::Notifier;
use super::types::AlertEvent;
use crate::domain::DeviceSnapshot;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// What happened to one alert event
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Notification delivered and cooldown started
    Sent(AlertEvent),
    /// Dropped because the same alert fired recently
    Suppressed {
        /// The dropped event
        event: AlertEvent,
        /// Time left in the cooldown window
        remaining: Duration,
    },
    /// Delivery failed; cooldown left untouched so the next snapshot retries
    Failed(AlertEvent),
}

impl DispatchOutcome {
    /// Whether a notification went out
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    /// The event this outcome is about
    pub fn event(&self) -> &AlertEvent {
        match self {
            Self::Sent(event) | Self::Failed(event) => event,
            Self::Suppressed { event, .. } => event,
        }
    }
}

/// Running totals for the process lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Snapshots classified
    pub snapshots: u64,
    /// Notifications delivered
    pub sent: u64,
    /// Alerts dropped by the cooldown gate
    pub suppressed: u64,
    /// Notifications that failed to deliver
    pub failed: u64,
}

/// Alert manager
///
/// Owns the cooldown state for the device it watches.
pub struct AlertManager {
    classifier: Classifier,
    gate: CooldownGate,
    notifier: Box<dyn Notifier>,
    recipients: Vec<String>,
    stats: DispatchStats,
}

impl AlertManager {
    /// Create a new alert manager
    pub fn new(
        classifier: Classifier,
        gate: CooldownGate,
        notifier: Box<dyn Notifier>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            classifier,
            gate,
            notifier,
            recipients,
            stats: DispatchStats::default(),
        }
    }

    /// Device being watched
    pub fn device_id(&self) -> &str {
        self.classifier.device_id()
    }

    /// Addresses every alert goes to
    pub fn recipients(&self) -> &[String] {
        &self.recipients
    }

    /// Cooldown state
    pub fn gate(&self) -> &CooldownGate {
        &self.gate
    }

    /// Totals so far
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Classify a snapshot and dispatch every resulting alert
    pub fn process_snapshot(
        &mut self,
        snapshot: &DeviceSnapshot,
        now: DateTime<Utc>,
    ) -> Vec<DispatchOutcome> {
        self.stats.snapshots += 1;
        self.classifier
            .classify(snapshot, now)
            .into_iter()
            .map(|event| self.dispatch(event, now))
            .collect()
    }

    /// Run one alert through the cooldown gate and the notifier
    pub fn dispatch(&mut self, event: AlertEvent, now: DateTime<Utc>) -> DispatchOutcome {
        if let Some(remaining) = self.gate.remaining(event.alert_type, &event.device_id, now) {
            log::info!(
                "⏳ {} alert in cooldown ({}s remaining)",
                event.alert_type,
                remaining.as_secs()
            );
            self.stats.suppressed += 1;
            return DispatchOutcome::Suppressed { event, remaining };
        }

        if !self.deliver(&event) {
            self.stats.failed += 1;
            return DispatchOutcome::Failed(event);
        }

        self.gate.record(event.alert_type, &event.device_id, now);
        self.stats.sent += 1;

        log::info!("{}", "=".repeat(60));
        log::info!("🚨 CRITICAL ALERT SENT");
        log::info!("Type: {}", event.alert_type);
        log::info!("Device: {}", event.device_id);
        log::info!("Details: {}", event.details);
        log::info!("Recipients: {} people", self.recipients.len());
        log::info!("Time: {}", now.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"));
        log::info!("{}", "=".repeat(60));

        DispatchOutcome::Sent(event)
    }

    /// Hand an alert to the notifier, reporting success without propagating errors
    pub fn deliver(&self, event: &AlertEvent) -> bool {
        match self.notifier.notify(event, &self.recipients) {
            Ok(()) => true,
            Err(e) => {
                log::error!(
                    "✗ {} notification for {} failed via {}: {}",
                    event.alert_type,
                    event.device_id,
                    self.notifier.name(),
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::notifier::EmailNotifier;
    use crate::alerts::report::Site;
    use crate::alerts::types::AlertType;
    use crate::domain::{Contact, ContactRoster, TemperatureThresholds};
    use crate::mock::RecordingTransport;
    use chrono::TimeDelta;
    use serde_json::json;
    use std::sync::Arc;

    fn roster() -> ContactRoster {
        ContactRoster::new(
            vec![
                Contact::new("Dr. John Doe", "doctor1@hospital.com", ""),
                Contact::new("Dr. Jane Smith", "doctor2@hospital.com", ""),
            ],
            vec![
                Contact::new("Nurse Alice", "nurse1@hospital.com", ""),
                // Also on the doctors list
                Contact::new("Dr. Jane Smith", "doctor2@hospital.com", ""),
            ],
        )
    }

    fn manager(transport: Arc<RecordingTransport>) -> AlertManager {
        AlertManager::new(
            Classifier::new(
                "INCUBATOR_001",
                TemperatureThresholds::new(34.0, 38.5).unwrap(),
            ),
            CooldownGate::new(Duration::from_secs(300)),
            Box::new(EmailNotifier::new(
                transport,
                Site::new("City_Hospital", "NICU Ward A"),
            )),
            roster().recipients(),
        )
    }

    fn cold() -> DeviceSnapshot {
        DeviceSnapshot::default()
            .with_current_temp(33.5)
            .with_status("NORMAL")
            .with_heater(true)
    }

    #[test]
    fn test_low_temperature_example() {
        let transport = Arc::new(RecordingTransport::new());
        let mut manager = manager(transport.clone());

        let outcomes = manager.process_snapshot(&cold(), Utc::now());
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_sent());
        assert_eq!(outcomes[0].event().alert_type, AlertType::CriticalLowTemp);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("INCUBATOR_001"));
        assert!(sent[0].subject.contains("CRITICAL LOW TEMPERATURE"));
        // Two doctors plus one nurse after de-duplication
        assert_eq!(sent[0].recipients.len(), 3);
    }

    #[test]
    fn test_sensor_fault_example() {
        let transport = Arc::new(RecordingTransport::new());
        let mut manager = manager(transport.clone());

        let snap = DeviceSnapshot::from_value(&json!({
            "currentTemp": 36.5,
            "status": "SENSOR_FAULT"
        }))
        .unwrap()
        .unwrap();
        let outcomes = manager.process_snapshot(&snap, Utc::now());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].event().alert_type, AlertType::SensorFault);
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn test_cooldown_suppresses_repeat_within_window() {
        let transport = Arc::new(RecordingTransport::new());
        let mut manager = manager(transport.clone());
        let t0 = Utc::now();

        assert!(manager.process_snapshot(&cold(), t0)[0].is_sent());
        let second = manager.process_snapshot(&cold(), t0 + TimeDelta::seconds(60));
        assert!(matches!(
            second[0],
            DispatchOutcome::Suppressed { remaining, .. } if remaining == Duration::from_secs(240)
        ));
        assert_eq!(transport.sent().len(), 1);

        let third = manager.process_snapshot(&cold(), t0 + TimeDelta::seconds(300));
        assert!(third[0].is_sent());
        assert_eq!(transport.sent().len(), 2);

        let stats = manager.stats();
        assert_eq!(stats.snapshots, 3);
        assert_eq!(stats.sent, 2);
        assert_eq!(stats.suppressed, 1);
    }

    #[test]
    fn test_failed_send_does_not_start_cooldown() {
        let transport = Arc::new(RecordingTransport::failing(2));
        let mut manager = manager(transport.clone());
        let t0 = Utc::now();

        let first = manager.process_snapshot(&cold(), t0);
        assert!(matches!(first[0], DispatchOutcome::Failed(_)));
        let second = manager.process_snapshot(&cold(), t0 + TimeDelta::seconds(5));
        assert!(matches!(second[0], DispatchOutcome::Failed(_)));
        assert!(manager
            .gate()
            .should_fire(AlertType::CriticalLowTemp, "INCUBATOR_001", t0 + TimeDelta::seconds(5)));

        let third = manager.process_snapshot(&cold(), t0 + TimeDelta::seconds(10));
        assert!(third[0].is_sent());
        let fourth = manager.process_snapshot(&cold(), t0 + TimeDelta::seconds(15));
        assert!(matches!(fourth[0], DispatchOutcome::Suppressed { .. }));

        assert_eq!(transport.attempts(), 3);
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(manager.stats().failed, 2);
    }

    #[test]
    fn test_recipients_same_for_every_alert_type() {
        let transport = Arc::new(RecordingTransport::new());
        let mut manager = manager(transport.clone());

        let snap = DeviceSnapshot::default()
            .with_current_temp(40.0)
            .with_status("EMERGENCY_SENSOR");
        let outcomes = manager.process_snapshot(&snap, Utc::now());
        assert_eq!(outcomes.len(), 3);

        let expected = roster().recipients();
        for mail in transport.sent() {
            assert_eq!(mail.recipients, expected);
        }
    }

    #[test]
    fn test_independent_types_do_not_share_cooldown() {
        let transport = Arc::new(RecordingTransport::new());
        let mut manager = manager(transport.clone());
        let t0 = Utc::now();

        manager.process_snapshot(&cold(), t0);
        let snap = DeviceSnapshot::default()
            .with_current_temp(36.0)
            .with_status("SENSOR_FAULT");
        let outcomes = manager.process_snapshot(&snap, t0 + TimeDelta::seconds(1));
        assert!(outcomes[0].is_sent());
        assert_eq!(transport.sent().len(), 2);
    }

    #[test]
    fn test_in_range_snapshot_sends_nothing() {
        let transport = Arc::new(RecordingTransport::new());
        let mut manager = manager(transport.clone());
        let snap = DeviceSnapshot::default()
            .with_current_temp(36.5)
            .with_status("NORMAL");
        assert!(manager.process_snapshot(&snap, Utc::now()).is_empty());
        assert_eq!(transport.attempts(), 0);
    }
}
