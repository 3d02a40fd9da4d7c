//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod check;
pub mod classify;
pub mod run;

pub use check::run_check;
pub use classify::run_classify;
pub use run::{run_monitor, run_session, SessionOutcome};

use crate::config::{Config, ConfigBuilder};
use crate::error::Result;

/// Load configuration from file and CLI overrides, without validating it
pub fn load_config(
    path: Option<&str>,
    dry_run: bool,
    smtp_password: Option<String>,
) -> Result<Config> {
    let config = ConfigBuilder::new()
        .with_file(path)?
        .with_dry_run(dry_run.then_some(true))
        .with_smtp_password(smtp_password)
        .build();
    Ok(config)
}
