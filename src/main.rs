//! incuwatch - incubator telemetry alerting
//!
//! A command-line service that watches an incubator's live state and
//! e-mails on-call staff when it becomes critical.

use clap::Parser;
use incuwatch::cli::args::{generate_completions, Cli, Commands};
use incuwatch::commands::{run_check, run_classify, run_monitor};
use incuwatch::error::{AppError, ConfigError, SourceError};

fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG still wins when set
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .init();

    // Run the appropriate command
    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let config = cli.config.as_deref();

    match &cli.command {
        Commands::Run(args) => run_monitor(args, cli.format, config, cli.dry_run),

        Commands::Check => run_check(cli.format, config, cli.dry_run),

        Commands::Classify(args) => run_classify(args, cli.format, config),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Create incuwatch.toml in the working directory,");
            eprintln!("      or pass --config / set INCUWATCH_CONFIG.");
        }
        AppError::Config(ConfigError::MissingField(field)) if field.starts_with("smtp.") => {
            eprintln!();
            eprintln!("Hint: Configure the [smtp] section, or use --dry-run to print");
            eprintln!("      alerts to the terminal instead of e-mailing them.");
        }
        AppError::Config(ConfigError::MissingField(field)) if field == "source.database_url" => {
            eprintln!();
            eprintln!("Hint: Set source.database_url, or use --replay FILE to feed");
            eprintln!("      snapshots from a file.");
        }
        AppError::Source(SourceError::Http(_)) => {
            eprintln!();
            eprintln!("Hint: Check network connectivity to the database.");
        }
        _ => {}
    }
}
