//! WebSocket message types: envelope and commands.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-to-client message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Request ID echoed from the command; server-generated for events.
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp.
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a message stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error message.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u32, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Client-to-server request: an optional correlation ID plus a command.
///
/// ```json
/// { "id": "1", "command": "subscribe", "session_ids": ["*"] }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WsRequest {
    /// Correlation ID echoed in the response.
    #[serde(default)]
    pub id: String,
    /// Command to run.
    #[serde(flatten)]
    pub command: WsCommand,
}

/// Commands that a client can send over WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to events of specific sessions.
    Subscribe {
        /// Session IDs to subscribe to. Use `["*"]` for all sessions.
        session_ids: Vec<String>,
    },
    /// Unsubscribe from events of specific sessions.
    Unsubscribe {
        /// Session IDs to unsubscribe from.
        session_ids: Vec<String>,
    },
    /// Read the current snapshot of a session.
    GetSnapshot {
        /// Target session ID.
        session_id: String,
    },
}
