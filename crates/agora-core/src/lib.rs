//! # agora-core
//!
//! Domain layer shared by the gateway and the client engine: message and
//! presence entities, the JSON wire frames exchanged over the persistent
//! connection, and the reserved close codes. This crate has zero
//! dependencies on infrastructure (sockets, web framework, etc.).

pub mod close_codes;
pub mod frames;
pub mod message;
pub mod moderation;
pub mod presence;

// Re-export commonly used types at crate root
pub use close_codes::CloseCode;
pub use frames::{ClientFrame, ServerFrame};
pub use message::{
    ChatMessage, MessageKind, MAX_AUDIO_PAYLOAD_BYTES, MAX_TEXT_CHARS, REDACTED_BY_MODERATOR,
    REDACTED_BY_SENDER, REDACTED_PLACEHOLDER,
};
pub use moderation::{BanRecord, BanStatus, OnlineUsers};
pub use presence::{PresenceEntry, UserRole};
