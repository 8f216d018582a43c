//! WebSocket close codes
//!
//! The gateway closes with a reserved code when it refuses or revokes a
//! session; everything else is treated as a transient transport loss.

use serde::{Deserialize, Serialize};

/// Reserved close codes sent by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum CloseCode {
    /// Invalid or expired credential at the handshake
    AuthFailed = 4001,
    /// Forced disconnect after a moderation ban
    Banned = 4002,
}

impl CloseCode {
    /// Create a `CloseCode` from a raw u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            4001 => Some(Self::AuthFailed),
            4002 => Some(Self::Banned),
            _ => None,
        }
    }

    /// Get the raw u16 value
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Check if the client should attempt to reconnect after this close code
    ///
    /// Both reserved codes are terminal; reconnecting would only repeat the
    /// rejection.
    #[must_use]
    pub const fn should_reconnect(self) -> bool {
        false
    }

    /// Check whether a raw close code permits automatic reconnection
    ///
    /// Codes outside the reserved range (including normal closure and
    /// abnormal drops) are treated as transient.
    #[must_use]
    pub fn reconnectable(value: u16) -> bool {
        Self::from_u16(value).is_none_or(CloseCode::should_reconnect)
    }

    /// Get the description for this close code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthFailed => "Invalid token",
            Self::Banned => "Banned from the community chat",
        }
    }

    /// Get the name of this close code
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AuthFailed => "AuthFailed",
            Self::Banned => "Banned",
        }
    }
}

impl std::fmt::Display for CloseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.as_u16(), self.description())
    }
}

impl From<CloseCode> for u16 {
    fn from(code: CloseCode) -> Self {
        code.as_u16()
    }
}
