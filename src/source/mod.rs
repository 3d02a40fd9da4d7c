//! Snapshot sources
//!
//! A source delivers device snapshots onto a channel from its own thread.
//! The dispatch loop is the only consumer, so arrival order is preserved and
//! no two snapshots are processed concurrently.
//!
//! - [`FirebaseSource`]: Firebase Realtime Database REST streaming
//! - [`ReplaySource`]: newline-delimited JSON from a file or stdin

mod auth;
mod firebase;
mod replay;
mod sse;

pub use auth::{DatabaseAuth, ServiceAccountKey};
pub use firebase::{FirebaseSettings, FirebaseSource};
pub use replay::{ReplayInput, ReplaySource};
pub use sse::{DocumentTree, SseEvent, SseParser};

use crate::domain::DeviceSnapshot;
use crate::error::SourceError;
use std::sync::mpsc::Sender;

/// Something arriving on the dispatch channel
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// A complete device snapshot
    Snapshot(DeviceSnapshot),
    /// The device published an empty document
    Empty,
    /// The source has nothing more to deliver
    Closed,
    /// Stop the dispatch loop
    Shutdown,
}

/// Push-style snapshot source
pub trait SnapshotSource: Send {
    /// Start delivering snapshots for `path` onto `events`
    ///
    /// Errors returned here are startup failures (bad credentials, unreadable
    /// input). Once this returns `Ok`, delivery happens on a background thread
    /// until the receiver is dropped or the source is exhausted.
    fn subscribe(&mut self, path: &str, events: Sender<SourceEvent>) -> Result<(), SourceError>;

    /// Human-readable description for logs
    fn description(&self) -> &str;
}

/// Database path holding the live state of a device
pub fn device_path(hospital: &str, device_id: &str) -> String {
    format!("{}/devices/{}/current", hospital, device_id)
}

/// Decode a document into a channel event
///
/// Documents that are not objects are logged and yield `None`.
pub(crate) fn decode_event(document: &serde_json::Value) -> Option<SourceEvent> {
    match DeviceSnapshot::from_value(document) {
        Ok(Some(snapshot)) => Some(SourceEvent::Snapshot(snapshot)),
        Ok(None) => Some(SourceEvent::Empty),
        Err(e) => {
            log::warn!("Dropping malformed snapshot: {}", e);
            None
        }
    }
}
