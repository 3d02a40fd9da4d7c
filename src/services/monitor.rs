//! Dispatch loop
//!
//! Consumes source events in arrival order, runs each snapshot through the
//! alert manager, and checks liveness on a fixed schedule between arrivals.

use crate::alerts::{AlertEvent, AlertManager, AlertType, DispatchOutcome};
use crate::config::StaleDataPolicy;
use crate::domain::DeviceSnapshot;
use crate::services::liveness::{
    LivenessMonitor, DEFAULT_LIVENESS_INTERVAL, DEFAULT_POWER_FAILURE_TIMEOUT,
};
use crate::source::SourceEvent;

use chrono::{DateTime, Utc};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

/// Configuration for the monitor
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between liveness checks
    pub liveness_interval: Duration,
    /// Silence tolerated before warning
    pub power_failure_timeout: Duration,
    /// Reaction to silence
    pub stale_data_policy: StaleDataPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            liveness_interval: DEFAULT_LIVENESS_INTERVAL,
            power_failure_timeout: DEFAULT_POWER_FAILURE_TIMEOUT,
            stale_data_policy: StaleDataPolicy::Log,
        }
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Shutdown was requested
    Shutdown,
    /// The source has nothing more to deliver
    SourceClosed,
    /// Every sender was dropped
    Disconnected,
}

/// Snapshot dispatch loop
pub struct Monitor {
    config: MonitorConfig,
    manager: AlertManager,
    liveness: LivenessMonitor,
    last_snapshot: Option<DeviceSnapshot>,
}

impl Monitor {
    /// Create a new monitor with the given configuration
    pub fn new(config: MonitorConfig, manager: AlertManager) -> Self {
        let liveness = LivenessMonitor::new(config.power_failure_timeout);
        Self {
            config,
            manager,
            liveness,
            last_snapshot: None,
        }
    }

    /// Get the monitor configuration
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The alert manager driven by this loop
    pub fn manager(&self) -> &AlertManager {
        &self.manager
    }

    /// Most recent snapshot received
    pub fn last_snapshot(&self) -> Option<&DeviceSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Run until shutdown, source exhaustion or disconnection
    pub fn run(&mut self, events: &Receiver<SourceEvent>) -> StopReason {
        let mut next_check = Instant::now() + self.config.liveness_interval;

        loop {
            let now = Instant::now();
            if now >= next_check {
                self.check_liveness(now, Utc::now());
                next_check = now + self.config.liveness_interval;
            }

            match events.recv_timeout(next_check.saturating_duration_since(now)) {
                Ok(event) => {
                    if let Some(reason) = self.handle(event, Instant::now(), Utc::now()) {
                        return reason;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::warn!("All snapshot sources disconnected");
                    return StopReason::Disconnected;
                }
            }
        }
    }

    /// Process one event; returns a reason when the loop should stop
    pub fn handle(
        &mut self,
        event: SourceEvent,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Option<StopReason> {
        match event {
            SourceEvent::Snapshot(snapshot) => {
                self.liveness.record(now);
                log::info!("📊 Data received: {}", snapshot);
                self.manager.process_snapshot(&snapshot, wall);
                self.last_snapshot = Some(snapshot);
                None
            }
            SourceEvent::Empty => {
                self.liveness.record(now);
                log::warn!("⚠️  No data received");
                None
            }
            SourceEvent::Closed => {
                log::info!("Snapshot source closed");
                Some(StopReason::SourceClosed)
            }
            SourceEvent::Shutdown => Some(StopReason::Shutdown),
        }
    }

    /// Warn about stale data, escalating per policy
    pub fn check_liveness(&mut self, now: Instant, wall: DateTime<Utc>) -> Option<DispatchOutcome> {
        let silence = self.liveness.check(now)?;
        log::warn!(
            "⚠️  WARNING: No data for {}s - possible power failure!",
            silence.as_secs()
        );

        if self.config.stale_data_policy != StaleDataPolicy::Email {
            return None;
        }

        let event = AlertEvent::new(
            AlertType::PowerFailure,
            self.manager.device_id(),
            format!(
                "No data received for {}s (timeout {}s). Possible power failure or connection loss.",
                silence.as_secs(),
                self.liveness.timeout().as_secs()
            ),
            self.last_snapshot.clone().unwrap_or_default(),
            wall,
        );
        Some(self.manager.dispatch(event, wall))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{Classifier, CooldownGate, EmailNotifier, Site};
    use crate::domain::TemperatureThresholds;
    use crate::mock::RecordingTransport;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    fn monitor(transport: Arc<RecordingTransport>, policy: StaleDataPolicy) -> Monitor {
        monitor_with(
            transport,
            MonitorConfig {
                stale_data_policy: policy,
                ..MonitorConfig::default()
            },
        )
    }

    fn monitor_with(transport: Arc<RecordingTransport>, config: MonitorConfig) -> Monitor {
        let manager = AlertManager::new(
            Classifier::new("INCUBATOR_001", TemperatureThresholds::default()),
            CooldownGate::new(Duration::from_secs(300)),
            Box::new(EmailNotifier::new(
                transport,
                Site::new("City_Hospital", "NICU Ward A"),
            )),
            vec!["doctor1@hospital.com".to_string(), "nurse1@hospital.com".to_string()],
        );
        Monitor::new(config, manager)
    }

    fn snapshot(temp: f64) -> SourceEvent {
        SourceEvent::Snapshot(DeviceSnapshot::default().with_current_temp(temp).with_status("NORMAL"))
    }

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.liveness_interval, Duration::from_secs(5));
        assert_eq!(config.power_failure_timeout, Duration::from_secs(15));
        assert_eq!(config.stale_data_policy, StaleDataPolicy::Log);
    }

    #[test]
    fn test_run_processes_in_order_until_shutdown() {
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = monitor(transport.clone(), StaleDataPolicy::Log);

        let (tx, rx) = mpsc::channel();
        tx.send(snapshot(36.5)).unwrap();
        tx.send(snapshot(33.0)).unwrap();
        tx.send(snapshot(32.5)).unwrap();
        tx.send(SourceEvent::Shutdown).unwrap();
        tx.send(snapshot(40.0)).unwrap();

        assert_eq!(monitor.run(&rx), StopReason::Shutdown);

        let stats = monitor.manager().stats();
        assert_eq!(stats.snapshots, 3);
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.suppressed, 1);
        assert_eq!(transport.sent().len(), 1);
        assert_eq!(monitor.last_snapshot().unwrap().current_temp, 32.5);
    }

    #[test]
    fn test_run_stops_when_source_closes() {
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = monitor(transport, StaleDataPolicy::Log);
        let (tx, rx) = mpsc::channel();
        tx.send(SourceEvent::Empty).unwrap();
        tx.send(SourceEvent::Closed).unwrap();
        assert_eq!(monitor.run(&rx), StopReason::SourceClosed);
        assert_eq!(monitor.manager().stats().snapshots, 0);
    }

    #[test]
    fn test_run_stops_on_disconnect() {
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = monitor(transport, StaleDataPolicy::Log);
        let (tx, rx) = mpsc::channel::<SourceEvent>();
        drop(tx);
        assert_eq!(monitor.run(&rx), StopReason::Disconnected);
    }

    #[test]
    fn test_no_liveness_warning_before_first_snapshot() {
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = monitor(transport.clone(), StaleDataPolicy::Email);
        let later = Instant::now() + Duration::from_secs(600);
        assert!(monitor.check_liveness(later, Utc::now()).is_none());
        assert_eq!(transport.attempts(), 0);
    }

    #[test]
    fn test_stale_data_logged_only_by_default() {
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = monitor(transport.clone(), StaleDataPolicy::Log);
        let start = Instant::now();
        monitor.handle(snapshot(36.5), start, Utc::now());

        assert!(monitor
            .check_liveness(start + Duration::from_secs(20), Utc::now())
            .is_none());
        assert_eq!(transport.attempts(), 0);
    }

    #[test]
    fn test_stale_data_escalates_with_email_policy() {
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = monitor(transport.clone(), StaleDataPolicy::Email);
        let start = Instant::now();
        let wall = Utc::now();
        monitor.handle(snapshot(36.5), start, wall);

        // Within the timeout: nothing
        assert!(monitor
            .check_liveness(start + Duration::from_secs(10), wall)
            .is_none());

        let outcome = monitor
            .check_liveness(start + Duration::from_secs(20), wall)
            .unwrap();
        assert!(outcome.is_sent());
        assert_eq!(outcome.event().alert_type, AlertType::PowerFailure);
        assert!(transport.sent()[0].subject.contains("POWER FAILURE"));

        // Repeated checks fall under the cooldown
        let outcome = monitor
            .check_liveness(start + Duration::from_secs(25), wall)
            .unwrap();
        assert!(!outcome.is_sent());
        assert_eq!(transport.sent().len(), 1);
    }

    #[test]
    fn test_empty_document_refreshes_liveness() {
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = monitor(transport, StaleDataPolicy::Log);
        let start = Instant::now();
        monitor.handle(snapshot(36.5), start, Utc::now());
        monitor.handle(SourceEvent::Empty, start + Duration::from_secs(14), Utc::now());
        assert!(monitor
            .check_liveness(start + Duration::from_secs(20), Utc::now())
            .is_none());
    }

    #[test]
    fn test_run_checks_liveness_between_events() {
        let transport = Arc::new(RecordingTransport::new());
        let mut monitor = monitor_with(
            transport.clone(),
            MonitorConfig {
                liveness_interval: Duration::from_millis(10),
                power_failure_timeout: Duration::from_millis(50),
                stale_data_policy: StaleDataPolicy::Email,
            },
        );

        let (tx, rx) = mpsc::channel();
        let feeder = thread::spawn(move || {
            tx.send(snapshot(36.5)).unwrap();
            thread::sleep(Duration::from_millis(300));
            tx.send(SourceEvent::Shutdown).unwrap();
        });

        assert_eq!(monitor.run(&rx), StopReason::Shutdown);
        feeder.join().unwrap();

        // One power-failure alert; later checks fall under the cooldown
        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].subject.contains("POWER FAILURE"));
        assert_eq!(monitor.manager().stats().sent, 1);
    }
}
