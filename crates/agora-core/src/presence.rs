//! Presence entities - who is connected to the room right now

use serde::{Deserialize, Serialize};

/// Role of a connected user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular community member
    #[serde(alias = "student")]
    Member,
    Admin,
    /// Automated community assistant
    Agent,
}

impl UserRole {
    /// Get the wire name of this role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Agent => "agent",
        }
    }

    /// Check if this role may moderate (ban users, delete any message)
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One connected user as seen by the roster
///
/// Keyed by `user_id`: the roster holds at most one entry per user, a
/// reconnecting user replaces their prior entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub user_id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: UserRole,
}

impl PresenceEntry {
    /// Create a new presence entry
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        avatar: Option<String>,
        role: UserRole,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            avatar,
            role,
        }
    }

    /// Check if this entry belongs to a moderator
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
