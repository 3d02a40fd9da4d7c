//! Configuration system
//!
//! Handles TOML config file parsing and CLI argument merging.

pub mod builder;
pub mod file;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::alerts::{SmtpSettings, Site};
use crate::domain::{ContactRoster, TemperatureThresholds};
use crate::error::{ConfigError, DomainError, SourceError};
use crate::source::{device_path, DatabaseAuth, ServiceAccountKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,
    /// Monitored device
    pub device: DeviceConfig,
    /// Real-time database connection
    pub source: SourceConfig,
    /// Outgoing mail
    pub smtp: SmtpConfig,
    /// Critical temperature band
    pub thresholds: ThresholdConfig,
    /// Cooldown and liveness timings
    pub alerting: AlertingConfig,
    /// On-call staff
    pub contacts: ContactRoster,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Print alerts instead of e-mailing them
    pub dry_run: bool,
}

/// Device identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device id, used in the database path and alert subjects
    pub id: String,
    /// Hospital key in the database
    pub hospital: String,
    /// Human-readable location shown in reports
    pub location: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            id: "INCUBATOR_001".to_string(),
            hospital: "City_Hospital".to_string(),
            location: "NICU Ward A".to_string(),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Database root URL
    pub database_url: String,
    /// Service-account key file
    pub service_account_path: Option<PathBuf>,
    /// Legacy database secret, used instead of the key file when set
    #[serde(skip_serializing)]
    pub database_secret: Option<String>,
    /// Delay before reopening a dropped stream
    pub reconnect_delay_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            service_account_path: Some(PathBuf::from("serviceAccountKey.json")),
            database_secret: None,
            reconnect_delay_secs: 5,
        }
    }
}

impl SourceConfig {
    /// Reconnect delay as a duration
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Load the credential the database connection should use
    pub fn auth(&self) -> Result<DatabaseAuth, SourceError> {
        if let Some(secret) = self.database_secret.as_ref().filter(|s| !s.is_empty()) {
            return Ok(DatabaseAuth::Secret(secret.clone()));
        }
        match &self.service_account_path {
            Some(path) => Ok(DatabaseAuth::service_account(ServiceAccountKey::load(path)?)),
            None => Ok(DatabaseAuth::Anonymous),
        }
    }
}

/// SMTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server hostname
    pub server: String,
    /// Server port (587 for STARTTLS, 465 for implicit TLS)
    pub port: u16,
    /// Sender address
    pub sender: String,
    /// Login name; the sender address when unset
    pub username: Option<String>,
    /// Login password
    #[serde(skip_serializing)]
    pub password: String,
    /// Connection timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            sender: String::new(),
            username: None,
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

impl SmtpConfig {
    /// Connection settings for the mail transport
    pub fn settings(&self) -> SmtpSettings {
        SmtpSettings {
            server: self.server.clone(),
            port: self.port,
            sender: self.sender.clone(),
            username: self.username.clone().unwrap_or_else(|| self.sender.clone()),
            password: self.password.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Threshold configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Critical minimum in Celsius
    pub critical_low_temp: f64,
    /// Critical maximum in Celsius
    pub critical_high_temp: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let thresholds = TemperatureThresholds::default();
        Self {
            critical_low_temp: thresholds.low(),
            critical_high_temp: thresholds.high(),
        }
    }
}

impl ThresholdConfig {
    /// Convert to a validated threshold band
    pub fn to_thresholds(&self) -> Result<TemperatureThresholds, DomainError> {
        TemperatureThresholds::new(self.critical_low_temp, self.critical_high_temp)
    }
}

/// What to do when data stops arriving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StaleDataPolicy {
    /// Log a warning only
    #[default]
    Log,
    /// Also send a power-failure alert
    Email,
}

impl fmt::Display for StaleDataPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => write!(f, "log"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// Alerting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertingConfig {
    /// Minimum seconds between two alerts of the same type
    pub cooldown_secs: u64,
    /// Seconds without data before the device is considered silent
    pub power_failure_timeout_secs: u64,
    /// Seconds between liveness checks
    pub liveness_interval_secs: u64,
    /// Reaction to silence
    pub stale_data_policy: StaleDataPolicy,
}

impl Default for AlertingConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 300,
            power_failure_timeout_secs: 15,
            liveness_interval_secs: 5,
            stale_data_policy: StaleDataPolicy::Log,
        }
    }
}

impl AlertingConfig {
    /// Cooldown window
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    /// Silence tolerated before warning
    pub fn power_failure_timeout(&self) -> Duration {
        Duration::from_secs(self.power_failure_timeout_secs)
    }

    /// Liveness check period
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_secs)
    }
}

impl Config {
    /// Validate the configuration before starting
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.id.trim().is_empty() {
            return Err(ConfigError::MissingField("device.id".to_string()));
        }
        if self.device.hospital.trim().is_empty() {
            return Err(ConfigError::MissingField("device.hospital".to_string()));
        }

        self.thresholds.to_thresholds()?;

        for (key, value) in [
            ("alerting.cooldown_secs", self.alerting.cooldown_secs),
            (
                "alerting.power_failure_timeout_secs",
                self.alerting.power_failure_timeout_secs,
            ),
            ("alerting.liveness_interval_secs", self.alerting.liveness_interval_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        if self.contacts.recipients().is_empty() {
            return Err(ConfigError::MissingField(
                "contacts (at least one doctor or nurse)".to_string(),
            ));
        }
        if let Some(contact) = self
            .contacts
            .doctors
            .iter()
            .chain(self.contacts.nurses.iter())
            .find(|c| c.email.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                key: "contacts".to_string(),
                message: format!("{} has no email address", contact.name),
            });
        }

        if !self.general.dry_run {
            if self.smtp.server.trim().is_empty() {
                return Err(ConfigError::MissingField("smtp.server".to_string()));
            }
            if self.smtp.sender.trim().is_empty() {
                return Err(ConfigError::MissingField("smtp.sender".to_string()));
            }
        }

        Ok(())
    }

    /// Validated threshold band
    pub fn thresholds(&self) -> Result<TemperatureThresholds, DomainError> {
        self.thresholds.to_thresholds()
    }

    /// Database path of the monitored device
    pub fn device_path(&self) -> String {
        device_path(&self.device.hospital, &self.device.id)
    }

    /// Site details shown in reports
    pub fn site(&self) -> Site {
        Site::new(&self.device.hospital, &self.device.location)
    }
}
