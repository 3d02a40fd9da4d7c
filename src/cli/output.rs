//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::alerts::{AlertEvent, AlertType};
use crate::cli::args::OutputFormat;
use crate::config::Config;
use crate::domain::{Contact, DeviceSnapshot};
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// Configuration summary shown at startup and by `check`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub device_id: String,
    pub hospital: String,
    pub location: String,
    pub database_path: String,
    pub critical_low_temp: f64,
    pub critical_high_temp: f64,
    pub cooldown_secs: u64,
    pub power_failure_timeout_secs: u64,
    pub liveness_interval_secs: u64,
    pub stale_data_policy: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender: String,
    pub doctors: Vec<Contact>,
    pub nurses: Vec<Contact>,
    pub recipients: Vec<String>,
    pub dry_run: bool,
}

impl From<&Config> for ConfigSummary {
    fn from(config: &Config) -> Self {
        Self {
            device_id: config.device.id.clone(),
            hospital: config.device.hospital.clone(),
            location: config.device.location.clone(),
            database_path: config.device_path(),
            critical_low_temp: config.thresholds.critical_low_temp,
            critical_high_temp: config.thresholds.critical_high_temp,
            cooldown_secs: config.alerting.cooldown_secs,
            power_failure_timeout_secs: config.alerting.power_failure_timeout_secs,
            liveness_interval_secs: config.alerting.liveness_interval_secs,
            stale_data_policy: config.alerting.stale_data_policy.to_string(),
            smtp_server: config.smtp.server.clone(),
            smtp_port: config.smtp.port,
            sender: config.smtp.sender.clone(),
            doctors: config.contacts.doctors.clone(),
            nurses: config.contacts.nurses.clone(),
            recipients: config.contacts.recipients(),
            dry_run: config.general.dry_run,
        }
    }
}

impl TableDisplay for ConfigSummary {
    fn to_table(&self) -> String {
        let mut output = format!(
            "Device: {}\nHospital: {}\nLocation: {}\nDatabase Path: {}\n",
            self.device_id, self.hospital, self.location, self.database_path
        );
        output.push_str(&format!(
            "Safe Range: {}°C - {}°C\n",
            self.critical_low_temp, self.critical_high_temp
        ));
        output.push_str(&format!("Alert Cooldown: {}s\n", self.cooldown_secs));
        output.push_str(&format!(
            "Power Failure Timeout: {}s (checked every {}s, policy: {})\n",
            self.power_failure_timeout_secs, self.liveness_interval_secs, self.stale_data_policy
        ));

        if self.dry_run {
            output.push_str("Delivery: dry run (terminal only)\n");
        } else {
            output.push_str(&format!(
                "Delivery: {} via {}:{}\n",
                self.sender, self.smtp_server, self.smtp_port
            ));
        }

        for (role, contacts) in [("Doctors", &self.doctors), ("Nurses", &self.nurses)] {
            output.push_str(&format!("{}: {}\n", role, contacts.len()));
            for contact in contacts {
                output.push_str(&format!("  - {}\n", contact));
            }
        }
        output.push_str(&format!("Recipients: {}\n", self.recipients.len()));

        output
    }

    fn to_compact(&self) -> String {
        format!(
            "{}@{} {}..{}°C cooldown={}s recipients={}",
            self.device_id,
            self.hospital,
            self.critical_low_temp,
            self.critical_high_temp,
            self.cooldown_secs,
            self.recipients.len()
        )
    }
}

/// One alert in a classification report
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedAlert {
    pub alert_type: AlertType,
    pub subject: String,
    pub details: String,
}

impl From<&AlertEvent> for ClassifiedAlert {
    fn from(event: &AlertEvent) -> Self {
        Self {
            alert_type: event.alert_type,
            subject: event.subject(),
            details: event.details.clone(),
        }
    }
}

/// Result of classifying one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub device_id: String,
    pub snapshot: DeviceSnapshot,
    pub alerts: Vec<ClassifiedAlert>,
    pub recipients: Vec<String>,
}

impl TableDisplay for ClassificationReport {
    fn to_table(&self) -> String {
        let mut output = format!("[{}] {}\n", self.device_id, self.snapshot);

        if self.alerts.is_empty() {
            output.push_str("  No alerts\n");
            return output;
        }

        for alert in &self.alerts {
            output.push_str(&format!("  {}\n", alert.subject));
            output.push_str(&format!("    {}\n", alert.details));
        }
        output.push_str(&format!("  Recipients: {}\n", self.recipients.join(", ")));

        output
    }

    fn to_compact(&self) -> String {
        if self.alerts.is_empty() {
            return format!("{}: ok", self.device_id);
        }
        let labels: Vec<&str> = self.alerts.iter().map(|a| a.alert_type.label()).collect();
        format!("{}: {}", self.device_id, labels.join(", "))
    }
}

/// Simple message output
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub message: String,
    pub success: bool,
}

impl TableDisplay for Message {
    fn to_table(&self) -> String {
        if self.success {
            format!("✓ {}", self.message)
        } else {
            format!("✗ {}", self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_config_summary_table() {
        let mut config = Config::default();
        config.smtp.sender = "alerts@example.com".to_string();
        config.contacts.doctors.push(Contact::new("Dr. John Doe", "doctor1@hospital.com", ""));
        config.contacts.nurses.push(Contact::new("Nurse Alice", "nurse1@hospital.com", ""));

        let summary = ConfigSummary::from(&config);
        let table = summary.to_table();
        assert!(table.contains("Device: INCUBATOR_001"));
        assert!(table.contains("Safe Range: 34°C - 38.5°C"));
        assert!(table.contains("Doctors: 1\n  - Dr. John Doe (doctor1@hospital.com)\n"));
        assert!(table.contains("Nurses: 1\n  - Nurse Alice (nurse1@hospital.com)\n"));
        assert!(table.contains("Recipients: 2"));
        assert!(table.contains("alerts@example.com via smtp.gmail.com:587"));
        assert_eq!(
            summary.to_compact(),
            "INCUBATOR_001@City_Hospital 34..38.5°C cooldown=300s recipients=2"
        );
    }

    #[test]
    fn test_classification_report() {
        let snapshot = DeviceSnapshot::default().with_current_temp(33.5);
        let event = AlertEvent::new(
            AlertType::CriticalLowTemp,
            "INCUBATOR_001",
            "Temperature dangerously low: 33.5°C (Critical minimum: 34.0°C)",
            snapshot.clone(),
            Utc::now(),
        );
        let report = ClassificationReport {
            device_id: "INCUBATOR_001".to_string(),
            snapshot,
            alerts: vec![ClassifiedAlert::from(&event)],
            recipients: vec!["doctor1@hospital.com".to_string()],
        };

        assert!(report.to_table().contains("CRITICAL LOW TEMPERATURE"));
        assert_eq!(report.to_compact(), "INCUBATOR_001: CRITICAL LOW TEMPERATURE");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["alerts"][0]["alert_type"], "critical_low_temp");
        assert_eq!(json["snapshot"]["currentTemp"], 33.5);
    }

    #[test]
    fn test_message_display() {
        let msg = Message {
            message: "Configuration is valid".to_string(),
            success: true,
        };

        assert!(msg.to_table().starts_with('✓'));
    }
}
