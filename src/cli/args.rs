//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Incubator telemetry alerting service
///
/// Watches an incubator's live state and e-mails on-call staff when it
/// leaves the safe range.
#[derive(Parser, Debug)]
#[command(name = "incuwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "INCUWATCH_CONFIG")]
    pub config: Option<String>,

    /// Dry run mode - print alerts instead of sending e-mail
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start monitoring the device
    Run(RunArgs),

    /// Validate the configuration and print a summary
    Check,

    /// Classify a single snapshot and show the alerts it would raise
    Classify(ClassifyArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Replay newline-delimited JSON snapshots from a file ("-" for stdin)
    /// instead of connecting to the database
    #[arg(long, value_name = "FILE")]
    pub replay: Option<String>,

    /// Delay between replayed snapshots in milliseconds
    #[arg(long, default_value = "0", requires = "replay")]
    pub replay_pace_ms: u64,

    /// SMTP password (overrides the configuration file)
    #[arg(long, env = "INCUWATCH_SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,
}

/// Arguments for the classify command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    /// Snapshot JSON; read from stdin when omitted
    pub snapshot: Option<String>,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
