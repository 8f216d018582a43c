//! # agora-client
//!
//! Client engine for the community chat service. One [`ChatSession`] owns a
//! persistent authenticated connection to the gateway, keeps it alive through
//! transient network loss, and applies every inbound frame in arrival order
//! to its local state (message log, presence roster, typing set). A UI layer
//! reads that state and subscribes to [`SessionEvent`]s; it never mutates the
//! state directly.
//!
//! Voice messages are captured and played through the backend traits in
//! [`voice`], so the engine stays independent of any particular audio stack.

pub mod config;
pub mod error;
pub mod log;
pub mod notify;
pub mod processor;
pub mod rest;
pub mod roster;
pub mod session;
pub mod transport;
pub mod typing;
pub mod voice;

// Re-export commonly used types at crate root
pub use config::SessionConfig;
pub use error::ClientError;
pub use log::MessageLog;
pub use notify::{MemoryPreferences, NotificationSink, Notifier, PreferenceStore, SOUND_PREF_KEY};
pub use processor::{ChatState, FrameOutcome, SessionEvent, StreamProcessor};
pub use rest::ChatApi;
pub use roster::PresenceRoster;
pub use session::{ChatSession, SessionHandle, SessionState};
pub use transport::{SessionTransport, TransportEvent};
pub use typing::{TypingDebouncer, TypingState};
pub use voice::{
    clip_label, negotiate, ActiveRecording, AudioEncoding, AudioInput, AudioOutput, CaptureError,
    CaptureStream, DecodeError, Playback, PlaybackError, Player, Recorder, VoiceClip,
};
