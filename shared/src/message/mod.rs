//! Realtime channel packet codec
//!
//! The marketplace pushes notifications over Socket.IO (protocol v5) on an
//! Engine.IO v4 WebSocket. One text frame carries one packet:
//!
//! | frame            | meaning                         |
//! |------------------|---------------------------------|
//! | `0{...}`         | open handshake                  |
//! | `1`              | close                           |
//! | `2` / `3`        | ping / pong                     |
//! | `6`              | noop                            |
//! | `40{...}`        | namespace connect               |
//! | `41`             | namespace disconnect            |
//! | `42["name",{}]`  | event                           |
//! | `44{...}`        | connect error                   |
//!
//! Event frames may carry a namespace (`42/ns,[...]`) and an ack id
//! (`4217[...]`); both are accepted and dropped on decode.

use crate::error::{AppError, ErrorCode};
use crate::models::Notification;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Event pushed by the service for every new notification
pub const NOTIFICATION_EVENT: &str = "notification";
/// Event the client emits to subscribe to its per-user room
pub const JOIN_USER_ROOM_EVENT: &str = "join_user_room";

/// Engine.IO open handshake body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// Named event with a single JSON argument
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelEvent {
    pub name: String,
    pub data: Value,
}

impl ChannelEvent {
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// `join_user_room { user_id }`
    pub fn join_user_room(user_id: &str) -> Self {
        Self::new(
            JOIN_USER_ROOM_EVENT,
            serde_json::json!({ "user_id": user_id }),
        )
    }

    pub fn notification(notification: &Notification) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            NOTIFICATION_EVENT,
            serde_json::to_value(notification)?,
        ))
    }

    /// Decode the payload when this is a `notification` event
    pub fn parse_notification(&self) -> Option<Result<Notification, serde_json::Error>> {
        (self.name == NOTIFICATION_EVENT).then(|| Notification::deserialize(&self.data))
    }

    /// Target user of a `join_user_room` event
    pub fn joined_user(&self) -> Option<&str> {
        if self.name != JOIN_USER_ROOM_EVENT {
            return None;
        }
        self.data.get("user_id").and_then(Value::as_str)
    }
}

/// One decoded frame
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Noop,
    Connect(Option<Value>),
    Disconnect,
    Event(ChannelEvent),
    ConnectError(Value),
}

/// Frame decode failure
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown packet type: {0}")]
    UnknownType(String),

    #[error("Malformed packet body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("Event packet without a name")]
    MissingEventName,
}

impl From<PacketError> for AppError {
    fn from(err: PacketError) -> Self {
        AppError::with_message(ErrorCode::InvalidPacket, err.to_string())
    }
}

impl Packet {
    /// Encode into a text frame
    pub fn encode(&self) -> String {
        match self {
            Packet::Open(handshake) => {
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Noop => "6".to_string(),
            Packet::Connect(None) => "40".to_string(),
            Packet::Connect(Some(auth)) => format!("40{}", auth),
            Packet::Disconnect => "41".to_string(),
            Packet::Event(event) => {
                let body = Value::Array(vec![Value::String(event.name.clone()), event.data.clone()]);
                format!("42{}", body)
            }
            Packet::ConnectError(body) => format!("44{}", body),
        }
    }

    /// Decode a text frame
    pub fn decode(frame: &str) -> Result<Packet, PacketError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();
        match kind {
            '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Packet::Close),
            // `2probe` / `3probe` belong to transport upgrades; the payload is irrelevant here
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '6' => Ok(Packet::Noop),
            '4' => Self::decode_message(rest),
            other => Err(PacketError::UnknownType(other.to_string())),
        }
    }

    fn decode_message(body: &str) -> Result<Packet, PacketError> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let rest = skip_namespace(chars.as_str());
        match kind {
            '0' if rest.is_empty() => Ok(Packet::Connect(None)),
            '0' => Ok(Packet::Connect(Some(serde_json::from_str(rest)?))),
            '1' => Ok(Packet::Disconnect),
            '2' => {
                let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
                let mut args: Vec<Value> = serde_json::from_str(rest)?;
                if args.is_empty() {
                    return Err(PacketError::MissingEventName);
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    _ => return Err(PacketError::MissingEventName),
                };
                let data = if args.is_empty() {
                    Value::Null
                } else {
                    args.remove(0)
                };
                Ok(Packet::Event(ChannelEvent { name, data }))
            }
            '4' => Ok(Packet::ConnectError(if rest.is_empty() {
                Value::Null
            } else {
                serde_json::from_str(rest)?
            })),
            other => Err(PacketError::UnknownType(format!("4{}", other))),
        }
    }
}

/// Strip a leading `/namespace,` if present
fn skip_namespace(body: &str) -> &str {
    if body.starts_with('/') {
        match body.find(',') {
            Some(idx) => &body[idx + 1..],
            None => "",
        }
    } else {
        body
    }
}
