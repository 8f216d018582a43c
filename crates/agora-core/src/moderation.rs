//! Moderation records shared by the gateway REST surface and its clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One active ban
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanRecord {
    pub user_id: String,
    /// Display name when it was resolvable at ban time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub banned_by: String,
    pub reason: String,
    pub banned_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl BanRecord {
    /// Check if this ban is still in force
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Answer to a caller asking about their own standing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanStatus {
    pub banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl BanStatus {
    /// Status for a user in good standing
    #[must_use]
    pub fn clear() -> Self {
        Self {
            banned: false,
            reason: None,
            expires_at: None,
        }
    }

    /// Status reflecting an active ban
    #[must_use]
    pub fn banned(reason: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            banned: true,
            reason: Some(reason.into()),
            expires_at: Some(expires_at),
        }
    }
}

/// Roster snapshot returned by the online endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUsers {
    pub online_users: Vec<crate::presence::PresenceEntry>,
    pub count: usize,
}
