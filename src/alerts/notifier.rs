//! Alert notification channels
//!
//! E-mail delivery for real alerts and a terminal channel for dry runs.

use super::report::{AlertReport, Site};
use super::transport::{MailTransport, OutgoingMail};
use super::types::AlertEvent;
use crate::domain::on_off;
use crate::error::NotifyError;
use chrono::Local;
use std::io::{self, Write};

/// Notification channel trait
pub trait Notifier: Send + Sync {
    /// Deliver an alert to the given recipients
    fn notify(&self, event: &AlertEvent, recipients: &[String]) -> Result<(), NotifyError>;

    /// Channel name for identification
    fn name(&self) -> &str;
}

/// E-mail notifier
///
/// Renders an [`AlertReport`] and hands it to a [`MailTransport`] as a single
/// message addressed to every recipient.
pub struct EmailNotifier<T: MailTransport> {
    transport: T,
    site: Site,
}

impl<T: MailTransport> EmailNotifier<T> {
    /// Create a new e-mail notifier
    pub fn new(transport: T, site: Site) -> Self {
        Self { transport, site }
    }

    /// Build the message that would be sent for an alert
    pub fn compose(
        &self,
        event: &AlertEvent,
        recipients: &[String],
    ) -> Result<OutgoingMail, NotifyError> {
        let report = AlertReport::render(event, &self.site)?;
        Ok(OutgoingMail {
            subject: report.subject,
            recipients: recipients.to_vec(),
            text_body: report.text,
            html_body: report.html,
        })
    }
}

impl<T: MailTransport> Notifier for EmailNotifier<T> {
    fn notify(&self, event: &AlertEvent, recipients: &[String]) -> Result<(), NotifyError> {
        if recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let mail = self.compose(event, recipients)?;
        self.transport.send(&mail)?;

        log::info!("✓ Email sent: {}", mail.subject);
        log::info!("  Recipients: {}", mail.recipients.join(", "));
        Ok(())
    }

    fn name(&self) -> &str {
        "email"
    }
}

/// Terminal/console notifier
///
/// Prints alerts instead of mailing them. Used for `--dry-run`.
pub struct TerminalNotifier {
    /// Use stderr instead of stdout
    use_stderr: bool,
    /// Use colors (ANSI escape codes)
    use_colors: bool,
}

impl TerminalNotifier {
    /// Create a new terminal notifier
    pub fn new() -> Self {
        Self {
            use_stderr: true,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier that uses stdout
    pub fn stdout() -> Self {
        Self {
            use_stderr: false,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier without colors
    pub fn no_color() -> Self {
        Self {
            use_stderr: true,
            use_colors: false,
        }
    }

    fn supports_color() -> bool {
        std::env::var("TERM")
            .map(|term| term != "dumb")
            .unwrap_or(false)
    }

    fn format_alert(&self, event: &AlertEvent, recipients: &[String]) -> String {
        let label = if self.use_colors {
            format!("\x1b[31m\x1b[1m{}\x1b[0m", event.alert_type)
        } else {
            event.alert_type.to_string()
        };
        let snap = &event.snapshot;

        format!(
            "[{}] {} {}: {}\n  Temp {:.1}°C (target {:.1}°C) | Status {} | Heater {} | Cooler {}\n  Would notify: {}",
            event.detected_at.with_timezone(&Local).format("%H:%M:%S"),
            label,
            event.device_id,
            event.details,
            snap.current_temp,
            snap.target_temp,
            snap.status_label(),
            on_off(snap.heater_state),
            on_off(snap.cooler_state),
            recipients.join(", ")
        )
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, event: &AlertEvent, recipients: &[String]) -> Result<(), NotifyError> {
        let message = self.format_alert(event, recipients);

        if self.use_stderr {
            let stderr = io::stderr();
            let mut handle = stderr.lock();
            writeln!(handle, "{}", message)?;
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", message)?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::types::AlertType;
    use crate::domain::DeviceSnapshot;
    use crate::mock::RecordingTransport;
    use chrono::Utc;
    use std::sync::Arc;

    fn event() -> AlertEvent {
        AlertEvent::new(
            AlertType::CriticalHighTemp,
            "INCUBATOR_001",
            "Temperature dangerously high: 39.0°C (Critical maximum: 38.5°C)",
            DeviceSnapshot::default().with_current_temp(39.0),
            Utc::now(),
        )
    }

    fn recipients() -> Vec<String> {
        vec![
            "doctor1@hospital.com".to_string(),
            "nurse1@hospital.com".to_string(),
        ]
    }

    #[test]
    fn test_email_notifier_sends_single_message() {
        let transport = Arc::new(RecordingTransport::new());
        let notifier = EmailNotifier::new(transport.clone(), Site::new("City_Hospital", "NICU"));

        notifier.notify(&event(), &recipients()).unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipients, recipients());
        assert!(sent[0].subject.contains("INCUBATOR_001"));
        assert!(sent[0].subject.contains("CRITICAL HIGH TEMPERATURE"));
        assert!(sent[0].html_body.contains("City_Hospital"));
        assert_eq!(notifier.name(), "email");
    }

    #[test]
    fn test_email_notifier_propagates_failure() {
        let transport = Arc::new(RecordingTransport::failing(1));
        let notifier = EmailNotifier::new(transport.clone(), Site::new("City_Hospital", "NICU"));

        assert!(notifier.notify(&event(), &recipients()).is_err());
        assert!(transport.sent().is_empty());
        assert_eq!(transport.attempts(), 1);
    }

    #[test]
    fn test_email_notifier_requires_recipients() {
        let transport = Arc::new(RecordingTransport::new());
        let notifier = EmailNotifier::new(transport.clone(), Site::new("City_Hospital", "NICU"));
        assert!(matches!(
            notifier.notify(&event(), &[]),
            Err(NotifyError::NoRecipients)
        ));
        assert_eq!(transport.attempts(), 0);
    }

    #[test]
    fn test_terminal_notifier_variants() {
        assert!(TerminalNotifier::new().use_stderr);
        assert!(!TerminalNotifier::stdout().use_stderr);
        assert!(!TerminalNotifier::no_color().use_colors);
        assert_eq!(TerminalNotifier::default().name(), "terminal");
    }

    #[test]
    fn test_terminal_format() {
        let notifier = TerminalNotifier::no_color();
        let text = notifier.format_alert(&event(), &recipients());
        assert!(text.contains("CRITICAL HIGH TEMPERATURE INCUBATOR_001"));
        assert!(text.contains("Temp 39.0°C (target 36.5°C)"));
        assert!(text.contains("Would notify: doctor1@hospital.com, nurse1@hospital.com"));
    }

    #[test]
    fn test_terminal_notify() {
        let notifier = TerminalNotifier::stdout();
        assert!(notifier.notify(&event(), &recipients()).is_ok());
    }
}
