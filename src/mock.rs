//! Mock implementations for testing
//!
//! Provides a recording mail transport and a scripted snapshot source so the
//! alert pipeline can be exercised without an SMTP server or a database.

use crate::alerts::{MailTransport, OutgoingMail};
use crate::error::{NotifyError, SourceError};
use crate::source::{SnapshotSource, SourceEvent};

use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// Mail transport that records messages instead of sending them
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingMail>>,
    attempts: Mutex<usize>,
    failures_left: Mutex<usize>,
}

impl RecordingTransport {
    /// Create a transport where every send succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport whose first `count` sends fail
    pub fn failing(count: usize) -> Self {
        Self {
            failures_left: Mutex::new(count),
            ..Self::default()
        }
    }

    /// Messages delivered so far
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of send attempts, successful or not
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl MailTransport for RecordingTransport {
    fn send(&self, mail: &OutgoingMail) -> Result<(), NotifyError> {
        *self.attempts.lock().unwrap() += 1;

        let mut failures_left = self.failures_left.lock().unwrap();
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(NotifyError::Build("simulated transport failure".to_string()));
        }

        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Snapshot source that replays a fixed list of events
#[derive(Debug, Default)]
pub struct ScriptedSource {
    events: Vec<SourceEvent>,
    fail_with: Option<String>,
    subscribed: Vec<String>,
}

impl ScriptedSource {
    /// Deliver `events`, then [`SourceEvent::Closed`]
    pub fn new(events: Vec<SourceEvent>) -> Self {
        Self {
            events,
            ..Self::default()
        }
    }

    /// A source whose subscription is rejected with a credential error
    pub fn rejecting(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    /// Paths passed to `subscribe`
    pub fn subscribed(&self) -> &[String] {
        &self.subscribed
    }
}

impl SnapshotSource for ScriptedSource {
    fn subscribe(&mut self, path: &str, events: Sender<SourceEvent>) -> Result<(), SourceError> {
        if let Some(message) = &self.fail_with {
            return Err(SourceError::Credentials(message.clone()));
        }

        self.subscribed.push(path.to_string());
        for event in self.events.drain(..) {
            if events.send(event).is_err() {
                return Ok(());
            }
        }
        let _ = events.send(SourceEvent::Closed);
        Ok(())
    }

    fn description(&self) -> &str {
        "scripted"
    }
}
