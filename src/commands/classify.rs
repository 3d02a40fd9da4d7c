//! Classify command implementation
//!
//! Runs one snapshot through the classifier and reports what would fire.
//! Nothing is sent and no cooldown state is involved.

use crate::alerts::Classifier;
use crate::cli::args::{ClassifyArgs, OutputFormat};
use crate::cli::output::{print_output, ClassificationReport, ClassifiedAlert};
use crate::commands::load_config;
use crate::config::Config;
use crate::domain::DeviceSnapshot;
use crate::error::{AppError, Result};

use chrono::Utc;
use std::io::Read;

/// Execute the classify command
pub fn run_classify(
    args: &ClassifyArgs,
    format: OutputFormat,
    config_path: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path, true, None)?;

    let document = match &args.snapshot {
        Some(json) => json.clone(),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let report = classify_document(&config, &document)?;
    print_output(&report, format)?;
    Ok(())
}

/// Classify a JSON snapshot using the configured thresholds
pub fn classify_document(config: &Config, document: &str) -> Result<ClassificationReport> {
    let value: serde_json::Value = serde_json::from_str(document.trim())
        .map_err(|e| AppError::InvalidSnapshot(e.to_string()))?;
    let snapshot = DeviceSnapshot::from_value(&value)
        .map_err(|e| AppError::InvalidSnapshot(e.to_string()))?
        .ok_or_else(|| AppError::InvalidSnapshot("document is empty".to_string()))?;

    let classifier = Classifier::new(config.device.id.clone(), config.thresholds()?);
    let alerts = classifier
        .classify(&snapshot, Utc::now())
        .iter()
        .map(ClassifiedAlert::from)
        .collect();

    Ok(ClassificationReport {
        device_id: config.device.id.clone(),
        snapshot,
        alerts,
        recipients: config.contacts.recipients(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertType;
    use crate::domain::Contact;

    fn config() -> Config {
        let mut config = Config::default();
        config.contacts.doctors.push(Contact::new("Dr. John Doe", "doctor1@hospital.com", ""));
        config.contacts.nurses.push(Contact::new("Nurse Alice", "nurse1@hospital.com", ""));
        config
    }

    #[test]
    fn test_classify_low_temperature() {
        let report = classify_document(
            &config(),
            r#"{"currentTemp": 33.5, "status": "NORMAL", "heaterState": true}"#,
        )
        .unwrap();
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].alert_type, AlertType::CriticalLowTemp);
        assert!(report.alerts[0].subject.contains("INCUBATOR_001"));
        assert_eq!(report.recipients.len(), 2);
    }

    #[test]
    fn test_classify_normal_reading() {
        let report =
            classify_document(&config(), r#"{"currentTemp": 36.5, "status": "NORMAL"}"#).unwrap();
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_classify_uses_configured_thresholds() {
        let mut config = config();
        config.thresholds.critical_low_temp = 33.0;
        let report = classify_document(&config, r#"{"currentTemp": 33.5}"#).unwrap();
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_classify_rejects_bad_input() {
        assert!(matches!(
            classify_document(&config(), "not json"),
            Err(AppError::InvalidSnapshot(_))
        ));
        assert!(matches!(
            classify_document(&config(), "{}"),
            Err(AppError::InvalidSnapshot(_))
        ));
        assert!(matches!(
            classify_document(&config(), "[1, 2]"),
            Err(AppError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_classify_rejects_inverted_thresholds() {
        let mut config = config();
        config.thresholds.critical_low_temp = 40.0;
        assert!(matches!(
            classify_document(&config, r#"{"currentTemp": 36.5}"#),
            Err(AppError::Domain(_))
        ));
    }
}
