//! Firebase Realtime Database streaming source
//!
//! Subscribes to a document over the REST streaming API
//! (`Accept: text/event-stream`) and republishes the whole document after
//! every change. The stream is reopened after a fixed delay when it drops,
//! or when it goes quiet for longer than the idle timeout. The server sends a
//! `keep-alive` event every 30 seconds, so a silent connection is a dead one.

use super::auth::DatabaseAuth;
use super::sse::{ChangePayload, DocumentTree, SseParser};
use super::{decode_event, SnapshotSource, SourceEvent};
use crate::error::SourceError;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::io::{self, BufRead, BufReader};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

/// TCP keepalive probe interval for the stream connection
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Connection settings for the database
#[derive(Debug, Clone)]
pub struct FirebaseSettings {
    /// Database root, e.g. `https://project-default-rtdb.firebaseio.com/`
    pub database_url: String,
    /// Delay before reopening a dropped stream
    pub reconnect_delay: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Silence after which an open stream is treated as dropped
    pub idle_timeout: Duration,
}

impl FirebaseSettings {
    /// Create settings with default timings
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            reconnect_delay: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
        }
    }
}

/// Why a stream stopped
#[derive(Debug, PartialEq, Eq)]
enum StreamEnd {
    /// Server closed the connection
    Closed,
    /// Nobody is listening any more
    ReceiverDropped,
}

/// Realtime Database source
#[derive(Debug)]
pub struct FirebaseSource {
    settings: FirebaseSettings,
    auth: DatabaseAuth,
    description: String,
}

impl FirebaseSource {
    /// Create a new source
    pub fn new(settings: FirebaseSettings, auth: DatabaseAuth) -> Self {
        let description = format!("firebase: {}", settings.database_url);
        Self {
            settings,
            auth,
            description,
        }
    }

    /// REST URL for a database path
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.settings.database_url.trim_end_matches('/'),
            path.trim_matches('/')
        )
    }

    fn client(&self) -> Result<Client, SourceError> {
        // No overall timeout: the stream stays open indefinitely
        Ok(Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .tcp_keepalive(TCP_KEEPALIVE)
            .timeout(None)
            .build()?)
    }
}

impl SnapshotSource for FirebaseSource {
    fn subscribe(&mut self, path: &str, events: Sender<SourceEvent>) -> Result<(), SourceError> {
        let client = self.client()?;

        // Fail startup now if the credential is unusable
        self.auth.query_param(&client)?;

        let url = self.url_for(path);
        let mut auth = self.auth.clone();
        let reconnect_delay = self.settings.reconnect_delay;
        let idle_timeout = self.settings.idle_timeout;

        thread::Builder::new()
            .name("firebase-stream".to_string())
            .spawn(move || loop {
                match stream_once(&client, &url, &mut auth, idle_timeout, &events) {
                    Ok(StreamEnd::ReceiverDropped) => break,
                    Ok(StreamEnd::Closed) => log::warn!("Database stream closed by server"),
                    Err(e) => {
                        if e.is_credential_error() {
                            auth.invalidate();
                        }
                        log::warn!("Database stream error: {}", e);
                    }
                }
                log::info!("Reconnecting in {:?}...", reconnect_delay);
                thread::sleep(reconnect_delay);
            })?;

        log::info!("Subscribed to {}", path);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn stream_once(
    client: &Client,
    url: &str,
    auth: &mut DatabaseAuth,
    idle_timeout: Duration,
    events: &Sender<SourceEvent>,
) -> Result<StreamEnd, SourceError> {
    let mut request = client.get(url).header("Accept", "text/event-stream");
    if let Some((name, value)) = auth.query_param(client)? {
        request = request.query(&[(name, value)]);
    }

    let response = request.send()?;
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(SourceError::Credentials(format!(
                "database rejected credentials ({})",
                response.status()
            )));
        }
        status if !status.is_success() => {
            return Err(SourceError::Stream(format!("unexpected status {}", status)));
        }
        _ => {}
    }

    log::debug!("Database stream open: {}", url);

    consume_stream(BufReader::new(response), idle_timeout, events)
}

/// Read lines on a helper thread so a silent connection can be abandoned
///
/// The helper stays blocked on a dead socket until TCP keepalive fails it.
fn spawn_line_reader<R>(reader: R) -> Result<Receiver<io::Result<String>>, SourceError>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("firebase-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Apply stream events to a local document and forward each new state
fn consume_stream<R>(
    reader: R,
    idle_timeout: Duration,
    events: &Sender<SourceEvent>,
) -> Result<StreamEnd, SourceError>
where
    R: BufRead + Send + 'static,
{
    let lines = spawn_line_reader(reader)?;
    let mut parser = SseParser::new();
    let mut tree = DocumentTree::new();

    loop {
        let line = match lines.recv_timeout(idle_timeout) {
            Ok(line) => line?,
            Err(RecvTimeoutError::Timeout) => {
                return Err(SourceError::Stream(format!(
                    "no data for {}s",
                    idle_timeout.as_secs()
                )));
            }
            Err(RecvTimeoutError::Disconnected) => return Ok(StreamEnd::Closed),
        };

        let Some(event) = parser.feed_line(&line) else {
            continue;
        };

        match event.event.as_str() {
            "put" | "patch" => {
                let change: ChangePayload = serde_json::from_str(&event.data)?;
                if event.event == "put" {
                    tree.put(&change.path, change.data);
                } else {
                    tree.patch(&change.path, change.data);
                }
                if let Some(update) = decode_event(tree.root()) {
                    if events.send(update).is_err() {
                        return Ok(StreamEnd::ReceiverDropped);
                    }
                }
            }
            "keep-alive" => {}
            "cancel" => {
                return Err(SourceError::Stream(format!(
                    "subscription cancelled: {}",
                    event.data
                )));
            }
            "auth_revoked" => {
                return Err(SourceError::Credentials(
                    "access token expired or revoked".to_string(),
                ));
            }
            other => log::debug!("Ignoring stream event '{}'", other),
        }
    }
}
