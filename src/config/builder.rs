//! Configuration builder
//!
//! Merges configuration from files and CLI arguments.

use crate::config::{Config, ConfigFile};
use crate::error::ConfigError;

/// Builder for merging configuration sources
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from an explicit file, or the default locations
    ///
    /// An explicit path that cannot be loaded is an error.
    pub fn with_file(mut self, path: Option<&str>) -> Result<Self, ConfigError> {
        let file_config = match path {
            Some(path) => {
                let config = ConfigFile::load(path)?;
                log::info!("Loaded config from {}", path);
                Some(config)
            }
            None => ConfigFile::load_default()?,
        };

        match file_config {
            Some(cfg) => self.config = cfg,
            None => log::warn!("No configuration file found, using defaults"),
        }

        Ok(self)
    }

    /// Override with CLI dry-run flag
    pub fn with_dry_run(mut self, dry_run: Option<bool>) -> Self {
        if let Some(d) = dry_run {
            self.config.general.dry_run = d;
        }
        self
    }

    /// Override the SMTP password (CLI or environment)
    pub fn with_smtp_password(mut self, password: Option<String>) -> Self {
        if let Some(p) = password {
            self.config.smtp.password = p;
        }
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
