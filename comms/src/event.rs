use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named chat channel as listed by the room directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Stable identifier of the room, used by every room scoped endpoint
    pub id: String,
    /// Human readable name of the room
    pub name: String,
}

impl Room {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A message of a room. The client does not enforce any schema on it,
/// whatever the service returns is kept and rendered as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(pub Value);

impl Message {
    /// Decodes the data of a single push event. Data which is not JSON is kept as a plain string.
    pub fn from_event_data(data: &str) -> Self {
        Message(serde_json::from_str(data).unwrap_or_else(|_| Value::String(data.to_string())))
    }
}

impl From<&str> for Message {
    fn from(content: &str) -> Self {
        Message(Value::String(content.to_string()))
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(content) => f.write_str(content),
            other => write!(f, "{}", other),
        }
    }
}

/// Service defined answer of the register, login, create room and send endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceReply(pub Value);

impl ServiceReply {
    /// Interprets a raw response body. An empty body is `null`, a body which is not JSON is kept as a string.
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return ServiceReply(Value::Null);
        }

        ServiceReply(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
    }
}
