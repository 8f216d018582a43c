//! Wire frames
//!
//! Every unit exchanged over the persistent connection is one JSON object
//! tagged by a `type` field. Unknown types deserialize to `Unknown` so that
//! either side can add frames without breaking the other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{ChatMessage, MessageKind};
use crate::presence::PresenceEntry;

/// Frames a client sends to the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Publish a message to the room
    Message {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message_type: Option<MessageKind>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audio_data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        audio_duration: Option<u32>,
    },
    /// The local user is typing; no stop signal exists, receivers expire it
    Typing,
    /// Application-level keepalive
    Ping,
    #[serde(other)]
    Unknown,
}

impl ClientFrame {
    /// Create a plain text message frame
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
            message_type: None,
            audio_data: None,
            audio_duration: None,
        }
    }

    /// Create a voice message frame carrying the encoded envelope
    #[must_use]
    pub fn voice(content: impl Into<String>, audio_data: impl Into<String>, audio_duration: u32) -> Self {
        Self::Message {
            content: content.into(),
            message_type: Some(MessageKind::Audio),
            audio_data: Some(audio_data.into()),
            audio_duration: Some(audio_duration),
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON string
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Frames the gateway sends to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Handshake acknowledgement: who you are plus the full roster snapshot
    Connected {
        user: PresenceEntry,
        online_users: Vec<PresenceEntry>,
    },
    /// A message was published to the room
    Message { message: ChatMessage },
    UserJoined {
        user: PresenceEntry,
        online_count: usize,
    },
    UserLeft {
        user_id: String,
        user_name: String,
        online_count: usize,
    },
    /// A message was soft-deleted; patch it in place
    MessageDeleted {
        message_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deleted_by: Option<String>,
    },
    Typing {
        user_id: String,
        user_name: String,
    },
    /// Personal moderation notice; the transport closes right after
    Banned {
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expires_at: Option<DateTime<Utc>>,
    },
    /// In-band announcement, rendered without an author
    System {
        content: String,
        created_at: DateTime<Utc>,
    },
    /// The last client frame was rejected; the connection stays up
    Error { message: String },
    Pong,
    #[serde(other)]
    Unknown,
}

impl ServerFrame {
    /// Create a system announcement frame stamped with the current time
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create an error frame for a rejected client frame
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse from a JSON string
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}
