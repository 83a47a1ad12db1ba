//! Client messages and server replies

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::framing::Frame;
use crate::counters::CountersSnapshot;
use crate::normalize::RawEvent;

/// Key whose presence turns a message into a status probe
pub const MONITOR_KEY: &str = "monitor_client";

/// Event fields as sent by the client
///
/// Missing fields, non-string values and unparseable payloads all end up
/// as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPayload {
    pub ua: Option<String>,
    pub url: Option<String>,
    pub client_ip: Option<String>,
}

impl EventPayload {
    #[must_use]
    pub fn as_raw(&self) -> RawEvent<'_> {
        RawEvent {
            ua: self.ua.as_deref(),
            url: self.url.as_deref(),
            client_ip: self.client_ip.as_deref(),
        }
    }
}

/// A decoded inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// An analytics event to persist
    Event(EventPayload),
    /// A request for the counter snapshot; nothing is written
    StatusProbe,
}

impl ClientMessage {
    /// Interpret one frame permissively
    ///
    /// A malformed frame is an event with no fields.
    #[must_use]
    pub fn from_frame(frame: Frame) -> Self {
        match frame {
            Frame::Value(value) => Self::from_value(&value),
            Frame::Malformed => Self::Event(EventPayload::default()),
        }
    }

    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::Event(EventPayload::default());
        };
        if object.contains_key(MONITOR_KEY) {
            return Self::StatusProbe;
        }

        let field = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
        Self::Event(EventPayload {
            ua: field("ua"),
            url: field("url"),
            client_ip: field("client_ip"),
        })
    }
}

/// Counters reported to a status probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: bool,
    pub received_messages: u64,
    pub current_clients: u64,
    pub all_connected_clients: u64,
    pub all_closed_client: u64,
    /// Live handles of the pool on the worker that answered
    pub database_connection_count: u64,
}

impl StatusSnapshot {
    #[must_use]
    pub fn new(counters: CountersSnapshot, database_connection_count: usize) -> Self {
        Self {
            status: true,
            received_messages: counters.received_messages,
            current_clients: counters.current_clients,
            all_connected_clients: counters.all_connected_clients,
            all_closed_client: counters.all_closed_client,
            database_connection_count: database_connection_count as u64,
        }
    }
}

#[derive(Serialize)]
struct Ack {
    status: bool,
}

/// What the server writes back for one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// `{"status":true}`
    Ack,
    Status(StatusSnapshot),
}

impl Reply {
    /// Serialize as one JSON line
    ///
    /// # Errors
    ///
    /// Only if serde_json fails, which these plain structs never trigger.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        let mut line = match self {
            Self::Ack => serde_json::to_vec(&Ack { status: true })?,
            Self::Status(snapshot) => serde_json::to_vec(snapshot)?,
        };
        line.push(b'\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_fields() {
        let msg = ClientMessage::from_value(&json!({
            "ua": "Mozilla/5.0",
            "url": "https://basalam.com/cart",
            "client_ip": "10.1.2.3",
        }));
        assert_eq!(
            msg,
            ClientMessage::Event(EventPayload {
                ua: Some("Mozilla/5.0".into()),
                url: Some("https://basalam.com/cart".into()),
                client_ip: Some("10.1.2.3".into()),
            })
        );
    }

    #[test]
    fn test_non_string_fields_are_ignored() {
        let msg = ClientMessage::from_value(&json!({"ua": 5, "url": null, "extra": "x"}));
        assert_eq!(msg, ClientMessage::Event(EventPayload::default()));
    }

    #[test]
    fn test_non_object_is_empty_event() {
        assert_eq!(
            ClientMessage::from_value(&json!([1, 2])),
            ClientMessage::Event(EventPayload::default())
        );
        assert_eq!(
            ClientMessage::from_frame(Frame::Malformed),
            ClientMessage::Event(EventPayload::default())
        );
    }

    #[test]
    fn test_monitor_key() {
        assert_eq!(
            ClientMessage::from_value(&json!({"monitor_client": true})),
            ClientMessage::StatusProbe
        );
        assert_eq!(
            ClientMessage::from_value(&json!({"monitor_client": 0, "ua": "x"})),
            ClientMessage::StatusProbe
        );
        assert_eq!(
            ClientMessage::from_value(&json!({"monitor_client": null})),
            ClientMessage::StatusProbe
        );
        assert!(matches!(
            ClientMessage::from_value(&json!({"monitor": true})),
            ClientMessage::Event(_)
        ));
    }

    #[test]
    fn test_ack_encoding() {
        assert_eq!(Reply::Ack.encode().unwrap(), b"{\"status\":true}\n");
    }

    #[test]
    fn test_status_encoding() {
        let snapshot = StatusSnapshot::new(
            CountersSnapshot {
                received_messages: 7,
                current_clients: 2,
                all_connected_clients: 5,
                all_closed_client: 3,
            },
            4,
        );
        let line = Reply::Status(snapshot).encode().unwrap();
        assert_eq!(line.last(), Some(&b'\n'));

        let value: Value = serde_json::from_slice(&line).unwrap();
        assert_eq!(
            value,
            json!({
                "status": true,
                "received_messages": 7,
                "current_clients": 2,
                "all_connected_clients": 5,
                "all_closed_client": 3,
                "database_connection_count": 4,
            })
        );
    }
}
