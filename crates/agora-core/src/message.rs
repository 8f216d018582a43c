//! Chat message entity and protocol limits

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a text message in characters
pub const MAX_TEXT_CHARS: usize = 1000;

/// Maximum size of an encoded voice payload in bytes
pub const MAX_AUDIO_PAYLOAD_BYTES: usize = 5_000_000;

/// Placeholder written when a sender removes their own message
pub const REDACTED_BY_SENDER: &str = "[message deleted]";

/// Placeholder written when a moderator removes someone else's message
pub const REDACTED_BY_MODERATOR: &str = "[message removed by a moderator]";

/// Placeholder applied locally when a `message_deleted` frame arrives
pub const REDACTED_PLACEHOLDER: &str = "[message removed]";

/// Kind of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Audio,
    System,
    /// Redacted record; the content is a placeholder
    Deleted,
}

impl MessageKind {
    /// Get the wire name of this kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
            Self::System => "system",
            Self::Deleted => "deleted",
        }
    }
}

/// One entry of the ordered community-room log
///
/// Messages are ordered by server arrival; clients append in frame order and
/// never reorder. Deletion is soft: the record keeps its id and position,
/// only the content is replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    pub content: String,
    pub message_type: MessageKind,
    /// Self-describing base64 envelope; present only for voice messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_data: Option<String>,
    /// Clip length in whole seconds; present only for voice messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_agent: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
}

impl ChatMessage {
    /// Create a text message with a fresh id and the current timestamp
    pub fn text(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        user_avatar: Option<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            user_name: user_name.into(),
            user_avatar,
            content: content.into(),
            message_type: MessageKind::Text,
            audio_data: None,
            audio_duration: None,
            created_at: Utc::now(),
            is_admin: false,
            is_agent: false,
            deleted: false,
            deleted_by: None,
        }
    }

    /// Create a voice message carrying an encoded payload envelope
    pub fn voice(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        user_avatar: Option<String>,
        content: impl Into<String>,
        audio_data: impl Into<String>,
        audio_duration: u32,
    ) -> Self {
        let mut message = Self::text(user_id, user_name, user_avatar, content);
        message.message_type = MessageKind::Audio;
        message.audio_data = Some(audio_data.into());
        message.audio_duration = Some(audio_duration);
        message
    }

    /// Create a synthetic, non-attributable announcement
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: "system".to_string(),
            user_name: "System".to_string(),
            user_avatar: None,
            content: content.into(),
            message_type: MessageKind::System,
            audio_data: None,
            audio_duration: None,
            created_at: Utc::now(),
            is_admin: false,
            is_agent: false,
            deleted: false,
            deleted_by: None,
        }
    }

    /// Check if this is a voice message with a payload still attached
    #[inline]
    pub fn is_voice(&self) -> bool {
        self.message_type == MessageKind::Audio && self.audio_data.is_some()
    }

    /// Check if this is an in-band announcement
    #[inline]
    pub fn is_system(&self) -> bool {
        self.message_type == MessageKind::System
    }

    /// Check if the content is empty after trimming
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Soft-delete in place: replace the content, drop the audio payload,
    /// keep id and position
    pub fn redact(&mut self, placeholder: &str, deleted_by: Option<String>) {
        self.content = placeholder.to_string();
        self.audio_data = None;
        self.message_type = MessageKind::Deleted;
        self.deleted = true;
        self.deleted_by = deleted_by;
    }
}
