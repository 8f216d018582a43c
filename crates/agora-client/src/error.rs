//! Client error taxonomy
//!
//! Transient transport failures are retried by the session; auth and
//! moderation rejections end it. Capture and decode failures stay local to
//! the voice pipeline and never take the live stream down.

use crate::voice::{CaptureError, DecodeError};

/// Errors surfaced by the client engine
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Network-level failure; the session retries these on its own
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The gateway rejected the credential; retrying cannot help
    #[error("authentication rejected")]
    Auth,

    /// The gateway revoked the session over a moderation action
    #[error("banned from the room: {reason}")]
    Banned { reason: String },

    /// Microphone acquisition or capture failed
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// A voice payload could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// A frame could not be serialized or parsed
    #[error("protocol error: {0}")]
    Protocol(#[from] serde_json::Error),

    /// A REST collaborator call failed
    #[error("api request failed: {0}")]
    Api(#[from] reqwest::Error),

    /// The session task is gone; commands can no longer be delivered
    #[error("session closed")]
    SessionClosed,
}

impl ClientError {
    /// Check if the session must stop instead of retrying
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Auth | Self::Banned { .. })
    }
}
