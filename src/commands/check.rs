//! Check command implementation
//!
//! Validates the configuration and the database credential without
//! connecting to anything.

use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, ConfigSummary, Message};
use crate::commands::load_config;
use crate::error::Result;

/// Execute the check command
pub fn run_check(format: OutputFormat, config_path: Option<&str>, dry_run: bool) -> Result<()> {
    let config = load_config(config_path, dry_run, None)?;
    config.validate()?;

    print_output(&ConfigSummary::from(&config), format)?;

    if config.source.database_url.is_empty() {
        let msg = Message {
            message: "No database URL configured; only --replay is available".to_string(),
            success: false,
        };
        print_output(&msg, format)?;
    } else {
        let auth = config.source.auth()?;
        log::debug!("Database credential: {:?}", auth);
    }

    let msg = Message {
        message: "Configuration is valid".to_string(),
        success: true,
    };
    print_output(&msg, format)?;

    Ok(())
}
