//! Alert evaluation and notification
//!
//! A snapshot flows through the [`Classifier`], each resulting event is
//! checked against the [`CooldownGate`], and permitted events are handed to a
//! [`Notifier`]. The [`AlertManager`] wires these together.

mod classifier;
mod cooldown;
mod manager;
mod notifier;
mod report;
mod transport;
mod types;

pub use classifier::Classifier;
pub use cooldown::{CooldownGate, DEFAULT_COOLDOWN};
pub use manager::{AlertManager, DispatchOutcome, DispatchStats};
pub use notifier::{EmailNotifier, Notifier, TerminalNotifier};
pub use report::{AlertReport, Site, RECOMMENDED_ACTIONS};
pub use transport::{MailTransport, OutgoingMail, SmtpMailer, SmtpSettings};
pub use types::{AlertEvent, AlertType};
