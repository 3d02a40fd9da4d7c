//! Unified error types for incuwatch
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from domain type validation
    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    /// Error from the snapshot source
    #[error("Snapshot source error: {0}")]
    Source(#[from] SourceError),

    /// Snapshot payload could not be decoded
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Ctrl-C handler could not be installed
    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from domain type validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Low threshold must be strictly below the high threshold
    #[error("Invalid temperature thresholds: low {low}°C must be below high {high}°C")]
    InvalidThresholds { low: f64, high: f64 },

    /// Temperature is NaN or infinite
    #[error("Invalid temperature: {0}")]
    InvalidTemperature(f64),

    /// Snapshot document is not a JSON object
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required config field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Domain validation failed while building the config
    #[error("{0}")]
    Domain(#[from] DomainError),
}

/// Errors from the real-time snapshot source
#[derive(Error, Debug)]
pub enum SourceError {
    /// Service credential could not be loaded or exchanged
    #[error("Credential error: {0}")]
    Credentials(String),

    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Signing the token request failed
    #[error("Token signing failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// Stream terminated or sent something unexpected
    #[error("Stream error: {0}")]
    Stream(String),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error while reading a stream or key file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from alert delivery
#[derive(Error, Debug)]
pub enum NotifyError {
    /// SMTP transport-level failure (authentication, connection, etc.)
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The report templates failed to render
    #[error("Report rendering failed: {0}")]
    Render(#[from] askama::Error),

    /// The MIME message could not be assembled
    #[error("Email build error: {0}")]
    Build(String),

    /// No recipients configured
    #[error("No recipients to notify")]
    NoRecipients,

    /// Writing to the terminal failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    /// Whether this error means the stream cannot authenticate
    pub fn is_credential_error(&self) -> bool {
        matches!(self, Self::Credentials(_) | Self::Jwt(_))
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_error_display() {
        let err = DomainError::InvalidThresholds {
            low: 38.0,
            high: 34.0,
        };
        assert!(err.to_string().contains("low 38°C"));
        assert!(err.to_string().contains("high 34°C"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "alerting.cooldown_secs".to_string(),
            message: "must be greater than zero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'alerting.cooldown_secs': must be greater than zero"
        );
    }

    #[test]
    fn test_error_conversion() {
        let domain_err = DomainError::InvalidTemperature(f64::NAN);
        let app_err: AppError = domain_err.into();
        assert!(matches!(app_err, AppError::Domain(_)));

        let source_err = SourceError::Credentials("missing key".to_string());
        assert!(source_err.is_credential_error());
        let app_err: AppError = source_err.into();
        assert!(matches!(app_err, AppError::Source(_)));
    }

    #[test]
    fn test_notify_error_display() {
        assert_eq!(
            NotifyError::NoRecipients.to_string(),
            "No recipients to notify"
        );
        let addr_err: std::result::Result<lettre::Address, _> = "not-an-email".parse();
        let err = NotifyError::Address(addr_err.unwrap_err());
        assert!(err.to_string().contains("Email address parse error"));
    }
}
