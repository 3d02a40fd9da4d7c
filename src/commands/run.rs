//! Run command implementation
//!
//! Connects the snapshot source to the dispatch loop and monitors until
//! Ctrl-C or until the source is exhausted.

use crate::alerts::{
    AlertManager, Classifier, CooldownGate, DispatchStats, EmailNotifier, Notifier, SmtpMailer,
    TerminalNotifier,
};
use crate::cli::args::{OutputFormat, RunArgs};
use crate::cli::output::{print_output, ConfigSummary};
use crate::commands::load_config;
use crate::config::Config;
use crate::error::{AppError, ConfigError, Result, SourceError};
use crate::services::{Monitor, MonitorConfig, StopReason};
use crate::source::{FirebaseSettings, FirebaseSource, ReplaySource, SnapshotSource, SourceEvent};

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

const BANNER_WIDTH: usize = 60;

/// How a monitoring session ended
#[derive(Debug)]
pub enum SessionOutcome {
    /// The source refused the credential before the loop started
    CredentialsRejected(SourceError),
    /// The loop ran and stopped
    Stopped {
        reason: StopReason,
        stats: DispatchStats,
    },
}

/// Execute the run command
pub fn run_monitor(
    args: &RunArgs,
    format: OutputFormat,
    config_path: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let config = load_config(config_path, dry_run, args.smtp_password.clone())?;
    config.validate()?;

    print_banner("🏥 INCUBATOR ALERT SYSTEM - STARTING");
    print_output(&ConfigSummary::from(&config), format)?;

    let source = match build_source(args, &config) {
        Ok(source) => source,
        Err(AppError::Source(e)) if e.is_credential_error() => {
            report_credential_failure(&e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    let manager = build_manager(&config)?;

    let (tx, rx) = mpsc::channel();
    let shutdown = tx.clone();
    ctrlc::set_handler(move || {
        let _ = shutdown.send(SourceEvent::Shutdown);
    })?;

    let outcome = run_session(
        source,
        manager,
        monitor_config(&config),
        &config.device_path(),
        (tx, rx),
    )?;

    match outcome {
        SessionOutcome::CredentialsRejected(e) => report_credential_failure(&e),
        SessionOutcome::Stopped { reason, stats } => {
            match reason {
                StopReason::Shutdown => print_banner("🛑 Alert system stopped by user"),
                StopReason::SourceClosed | StopReason::Disconnected => {
                    print_banner("🛑 Alert system stopped: no more data")
                }
            }
            println!(
                "Snapshots: {} | Alerts sent: {} | Suppressed: {} | Failed: {}",
                stats.snapshots, stats.sent, stats.suppressed, stats.failed
            );
        }
    }

    Ok(())
}

/// Subscribe `source` to `path` and dispatch its events until the loop stops
///
/// A credential rejected at subscription is reported as an outcome and the
/// loop is never entered. Other subscription failures are errors.
pub fn run_session(
    mut source: Box<dyn SnapshotSource>,
    manager: AlertManager,
    config: MonitorConfig,
    path: &str,
    (tx, rx): (Sender<SourceEvent>, Receiver<SourceEvent>),
) -> Result<SessionOutcome> {
    if let Err(e) = source.subscribe(path, tx) {
        if e.is_credential_error() {
            return Ok(SessionOutcome::CredentialsRejected(e));
        }
        return Err(e.into());
    }

    log::info!("🔍 Monitoring {} via {}", path, source.description());
    log::info!("Press Ctrl+C to stop");

    let mut monitor = Monitor::new(config, manager);
    let reason = monitor.run(&rx);
    Ok(SessionOutcome::Stopped {
        reason,
        stats: monitor.manager().stats(),
    })
}

fn build_source(args: &RunArgs, config: &Config) -> Result<Box<dyn SnapshotSource>> {
    if let Some(input) = &args.replay {
        return Ok(Box::new(ReplaySource::new(
            input.as_str(),
            Duration::from_millis(args.replay_pace_ms),
        )));
    }

    if config.source.database_url.trim().is_empty() {
        return Err(ConfigError::MissingField("source.database_url".to_string()).into());
    }

    let auth = config.source.auth()?;
    let settings = FirebaseSettings {
        reconnect_delay: config.source.reconnect_delay(),
        ..FirebaseSettings::new(config.source.database_url.clone())
    };
    log::info!("✓ Database credential loaded");
    Ok(Box::new(FirebaseSource::new(settings, auth)))
}

fn build_manager(config: &Config) -> Result<AlertManager> {
    let notifier: Box<dyn Notifier> = if config.general.dry_run {
        log::info!("Dry run: alerts will be printed, not e-mailed");
        Box::new(TerminalNotifier::new())
    } else {
        Box::new(EmailNotifier::new(
            SmtpMailer::new(config.smtp.settings()),
            config.site(),
        ))
    };

    Ok(AlertManager::new(
        Classifier::new(config.device.id.clone(), config.thresholds()?),
        CooldownGate::new(config.alerting.cooldown()),
        notifier,
        config.contacts.recipients(),
    ))
}

fn monitor_config(config: &Config) -> MonitorConfig {
    MonitorConfig {
        liveness_interval: config.alerting.liveness_interval(),
        power_failure_timeout: config.alerting.power_failure_timeout(),
        stale_data_policy: config.alerting.stale_data_policy,
    }
}

fn print_banner(title: &str) {
    println!("{}", "=".repeat(BANNER_WIDTH));
    println!("{}", title);
    println!("{}", "=".repeat(BANNER_WIDTH));
}

fn report_credential_failure(err: &SourceError) {
    eprintln!("❌ Failed to connect to the database: {}", err);
    eprintln!();
    eprintln!("Hint: Check that the service account key file exists and is valid.");
    eprintln!("      Download it from the project console under");
    eprintln!("      Project Settings > Service Accounts, and point");
    eprintln!("      source.service_account_path at it.");
}
