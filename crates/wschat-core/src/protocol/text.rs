//! Chat envelope (JSON inside text frames) and outbound payload shapes.
//!
//! Inbound messages are parsed into a loose JSON object first so that a
//! wrongly-typed field is a validation miss (silently dropped) rather than a
//! parse error. `Inbound::from_envelope` then narrows it to the closed set of
//! actions the server understands.

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, WsChatError};

/// Username stamped on notices generated by the server itself.
pub const SERVER_USERNAME: &str = "Server";

/// Action discriminator carried in the `action` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Join,
    Leave,
    Message,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "join" => Some(Action::Join),
            "leave" => Some(Action::Leave),
            "message" => Some(Action::Message),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Join => "join",
            Action::Leave => "leave",
            Action::Message => "message",
        }
    }
}

/// One decoded JSON object from a text frame.
#[derive(Debug, Clone)]
pub struct Envelope {
    fields: Map<String, Value>,
}

impl Envelope {
    /// Parse a payload that must be a JSON object.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let fields: Map<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| WsChatError::BadRequest(format!("invalid message json: {e}")))?;
        Ok(Self { fields })
    }

    /// Raw `action` value, if it is a string.
    pub fn action_name(&self) -> Option<&str> {
        self.fields.get("action").and_then(Value::as_str)
    }

    pub fn action(&self) -> Option<Action> {
        self.action_name().and_then(Action::parse)
    }

    /// A string field, treating empty strings and non-strings as absent.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Validated inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Join { room: String, username: String },
    Leave { room: String, username: String },
    Message { room: String, username: String, message: String },
}

impl Inbound {
    /// `None` when the action is missing or unknown, or when a required field
    /// is missing, empty, or not a string.
    pub fn from_envelope(env: &Envelope) -> Option<Self> {
        let room = env.str_field("room")?.to_owned();
        match env.action()? {
            Action::Join => {
                let username = env.str_field("username")?.to_owned();
                Some(Inbound::Join { room, username })
            }
            Action::Leave => {
                let username = env.str_field("username")?.to_owned();
                Some(Inbound::Leave { room, username })
            }
            Action::Message => {
                let message = env.str_field("message")?.to_owned();
                let username = env.str_field("username")?.to_owned();
                Some(Inbound::Message {
                    room,
                    username,
                    message,
                })
            }
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Inbound::Join { .. } => Action::Join,
            Inbound::Leave { .. } => Action::Leave,
            Inbound::Message { .. } => Action::Message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Join,
    Leave,
}

/// `{"username":"Server","type":...,"message":...}`
#[derive(Debug, Serialize)]
pub struct SystemNotice {
    pub username: &'static str,
    #[serde(rename = "type")]
    pub kind: NoticeKind,
    pub message: String,
}

impl SystemNotice {
    pub fn joined(username: &str) -> Self {
        Self {
            username: SERVER_USERNAME,
            kind: NoticeKind::Join,
            message: format!("{username} joined the room"),
        }
    }

    pub fn left(username: &str) -> Self {
        Self {
            username: SERVER_USERNAME,
            kind: NoticeKind::Leave,
            message: format!("{username} left the room"),
        }
    }

    pub fn to_bytes(&self) -> Result<Bytes> {
        to_json_bytes(self)
    }
}

/// `{"username":...,"message":...}`
#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub username: &'a str,
    pub message: &'a str,
}

impl ChatMessage<'_> {
    pub fn to_bytes(&self) -> Result<Bytes> {
        to_json_bytes(self)
    }
}

fn to_json_bytes<T: Serialize>(v: &T) -> Result<Bytes> {
    serde_json::to_vec(v)
        .map(Bytes::from)
        .map_err(|e| WsChatError::Internal(format!("json encode failed: {e}")))
}
