//! Server-sent events plumbing for the database stream
//!
//! [`SseParser`] turns `text/event-stream` lines into events and
//! [`DocumentTree`] applies the database's `put`/`patch` payloads to a local
//! copy of the watched document, so every change yields a full snapshot.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event name (`put`, `patch`, `keep-alive`, ...)
    pub event: String,
    /// Concatenated `data:` lines
    pub data: String,
}

/// Incremental `text/event-stream` parser
#[derive(Debug, Default)]
pub struct SseParser {
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Create an empty parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (without its terminator); returns an event on blank lines
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data);
        if event.is_none() && data.is_empty() {
            return None;
        }
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data: data.join("\n"),
        })
    }
}

/// Payload of `put` and `patch` events
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePayload {
    /// Location relative to the subscribed path
    pub path: String,
    /// New value (`put`) or children to merge (`patch`)
    pub data: Value,
}

/// Local mirror of the subscribed document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTree {
    root: Value,
}

impl DocumentTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Replace the value at `path`; `null` deletes
    pub fn put(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        put_at(&mut self.root, &segments, value);
    }

    /// Merge children into the object at `path`
    pub fn patch(&mut self, path: &str, children: Value) {
        match children {
            Value::Object(map) => {
                let base = path.trim_end_matches('/');
                for (key, value) in map {
                    self.put(&format!("{}/{}", base, key), value);
                }
            }
            other => self.put(path, other),
        }
    }
}

fn put_at(node: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if rest.is_empty() && value.is_null() {
        if let Value::Object(map) = node {
            map.remove(*head);
        }
        return;
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        put_at(child, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feed(parser: &mut SseParser, text: &str) -> Vec<SseEvent> {
        text.lines().filter_map(|l| parser.feed_line(l)).collect()
    }

    #[test]
    fn test_parse_put_event() {
        let mut parser = SseParser::new();
        let events = feed(
            &mut parser,
            "event: put\ndata: {\"path\":\"/\",\"data\":{\"currentTemp\":36.5}}\n\n",
        );
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "put");
        let payload: ChangePayload = serde_json::from_str(&events[0].data).unwrap();
        assert_eq!(payload.path, "/");
        assert_eq!(payload.data, json!({ "currentTemp": 36.5 }));
    }

    #[test]
    fn test_parse_keep_alive_and_comments() {
        let mut parser = SseParser::new();
        let events = feed(
            &mut parser,
            ": comment\r\nevent: keep-alive\r\ndata: null\r\n\r\n",
        );
        assert_eq!(
            events,
            vec![SseEvent {
                event: "keep-alive".to_string(),
                data: "null".to_string()
            }]
        );
    }

    #[test]
    fn test_multiline_data() {
        let mut parser = SseParser::new();
        let events = feed(&mut parser, "data: a\ndata: b\n\n");
        assert_eq!(events[0].event, "message");
        assert_eq!(events[0].data, "a\nb");
    }

    #[test]
    fn test_blank_lines_alone_dispatch_nothing() {
        let mut parser = SseParser::new();
        assert!(feed(&mut parser, "\n\n\n").is_empty());
    }

    #[test]
    fn test_tree_put_root_and_child() {
        let mut tree = DocumentTree::new();
        tree.put("/", json!({ "currentTemp": 36.5, "status": "NORMAL" }));
        tree.put("/currentTemp", json!(33.0));
        assert_eq!(
            tree.root(),
            &json!({ "currentTemp": 33.0, "status": "NORMAL" })
        );
    }

    #[test]
    fn test_tree_put_null_deletes() {
        let mut tree = DocumentTree::new();
        tree.put("/", json!({ "currentTemp": 36.5, "status": "NORMAL" }));
        tree.put("/status", Value::Null);
        assert_eq!(tree.root(), &json!({ "currentTemp": 36.5 }));

        tree.put("/", Value::Null);
        assert!(tree.root().is_null());
    }

    #[test]
    fn test_tree_patch_merges() {
        let mut tree = DocumentTree::new();
        tree.put("/", json!({ "currentTemp": 36.5, "heaterState": false }));
        tree.patch("/", json!({ "heaterState": true, "status": "HEATING" }));
        assert_eq!(
            tree.root(),
            &json!({ "currentTemp": 36.5, "heaterState": true, "status": "HEATING" })
        );
    }

    #[test]
    fn test_tree_nested_path_creates_objects() {
        let mut tree = DocumentTree::new();
        tree.put("/meta/firmware", json!("5.1"));
        assert_eq!(tree.root(), &json!({ "meta": { "firmware": "5.1" } }));
    }
}
