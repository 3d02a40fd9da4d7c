//! Replay source
//!
//! Reads newline-delimited JSON snapshots from a file or stdin and delivers
//! them at a fixed pace. Useful for drills and for exercising the alert path
//! without a live device.

use super::{decode_event, SnapshotSource, SourceEvent};
use crate::error::SourceError;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// Where replayed snapshots come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayInput {
    /// Standard input
    Stdin,
    /// A file on disk
    File(PathBuf),
}

impl From<&str> for ReplayInput {
    fn from(value: &str) -> Self {
        if value == "-" {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(value))
        }
    }
}

/// Newline-delimited JSON replay source
#[derive(Debug)]
pub struct ReplaySource {
    input: ReplayInput,
    pace: Duration,
    description: String,
}

impl ReplaySource {
    /// Create a replay source; `pace` is the delay between snapshots
    pub fn new(input: impl Into<ReplayInput>, pace: Duration) -> Self {
        let input = input.into();
        let description = match &input {
            ReplayInput::Stdin => "replay: stdin".to_string(),
            ReplayInput::File(path) => format!("replay: {}", path.display()),
        };
        Self {
            input,
            pace,
            description,
        }
    }

    fn open(&self) -> Result<Box<dyn Read + Send>, SourceError> {
        Ok(match &self.input {
            ReplayInput::Stdin => Box::new(io::stdin()),
            ReplayInput::File(path) => Box::new(File::open(path)?),
        })
    }
}

/// Deliver every line from `reader`, then a final [`SourceEvent::Closed`]
pub fn replay_lines<R: BufRead>(reader: R, pace: Duration, events: &Sender<SourceEvent>) {
    let mut first = true;
    for (idx, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("Replay read error: {}", e);
                break;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let document = match serde_json::from_str(trimmed) {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Replay line {}: invalid JSON: {}", idx + 1, e);
                continue;
            }
        };

        if !first && !pace.is_zero() {
            thread::sleep(pace);
        }
        first = false;

        if let Some(event) = decode_event(&document) {
            if events.send(event).is_err() {
                return;
            }
        }
    }
    let _ = events.send(SourceEvent::Closed);
}

impl SnapshotSource for ReplaySource {
    fn subscribe(&mut self, path: &str, events: Sender<SourceEvent>) -> Result<(), SourceError> {
        let reader = BufReader::new(self.open()?);
        let pace = self.pace;

        thread::Builder::new()
            .name("replay".to_string())
            .spawn(move || replay_lines(reader, pace, &events))?;

        log::info!("Replaying snapshots for {} from {}", path, self.description);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use std::sync::mpsc;

    #[test]
    fn test_replay_lines() {
        let input = "\
# drill: heater failure
{\"currentTemp\": 36.5, \"status\": \"NORMAL\"}

{\"currentTemp\": 33.0, \"status\": \"NORMAL\"}
not json
null
42
";
        let (tx, rx) = mpsc::channel();
        replay_lines(Cursor::new(input), Duration::ZERO, &tx);
        drop(tx);

        let events: Vec<SourceEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], SourceEvent::Snapshot(s) if s.current_temp == 36.5));
        assert!(matches!(&events[1], SourceEvent::Snapshot(s) if s.current_temp == 33.0));
        assert_eq!(events[2], SourceEvent::Empty);
        assert_eq!(events[3], SourceEvent::Closed);
    }

    #[test]
    fn test_replay_input_from_str() {
        assert_eq!(ReplayInput::from("-"), ReplayInput::Stdin);
        assert_eq!(
            ReplayInput::from("drill.jsonl"),
            ReplayInput::File(PathBuf::from("drill.jsonl"))
        );
    }

    #[test]
    fn test_subscribe_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"currentTemp\": 39.0, \"status\": \"NORMAL\"}}").unwrap();

        let mut source = ReplaySource::new(
            file.path().to_str().unwrap(),
            Duration::ZERO,
        );
        let (tx, rx) = mpsc::channel();
        source.subscribe("City_Hospital/devices/INCUBATOR_001/current", tx).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, SourceEvent::Snapshot(s) if s.current_temp == 39.0));
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second, SourceEvent::Closed);
    }

    #[test]
    fn test_subscribe_missing_file() {
        let mut source = ReplaySource::new("/nonexistent/drill.jsonl", Duration::ZERO);
        let (tx, _rx) = mpsc::channel();
        assert!(source.subscribe("x", tx).is_err());
    }
}
