//! Notification port
//!
//! Incoming messages from other users may trigger a local notification
//! (typically a sound). Both the sink that plays it and the store that
//! persists the user's preference are injected capabilities, so the engine
//! carries no global audio state and headless hosts can plug in no-ops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agora_core::ChatMessage;
use parking_lot::Mutex;

/// Preference key for the notification sound toggle
pub const SOUND_PREF_KEY: &str = "chat_sound_enabled";

/// Receives notification triggers for messages from other users
pub trait NotificationSink: Send + Sync {
    fn message_received(&self, message: &ChatMessage);
}

/// Key-value collaborator persisting user preferences across sessions
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory preference store for tests and headless hosts
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }
}

/// Gate between the message stream and the notification sink
///
/// Sound is on unless the stored preference says `"false"`; toggles are
/// written back through the store so they survive the session.
pub struct Notifier {
    sink: Option<Arc<dyn NotificationSink>>,
    prefs: Arc<dyn PreferenceStore>,
    sound_enabled: AtomicBool,
}

impl Notifier {
    /// Create a notifier reading its initial toggle from the store
    #[must_use]
    pub fn new(sink: Option<Arc<dyn NotificationSink>>, prefs: Arc<dyn PreferenceStore>) -> Self {
        let sound_enabled = prefs.get(SOUND_PREF_KEY).as_deref() != Some("false");
        Self {
            sink,
            prefs,
            sound_enabled: AtomicBool::new(sound_enabled),
        }
    }

    /// Create a silent notifier with in-memory preferences
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None, Arc::new(MemoryPreferences::new()))
    }

    /// Current state of the sound toggle
    #[must_use]
    pub fn is_sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    /// Flip the sound toggle and persist it
    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
        self.prefs
            .set(SOUND_PREF_KEY, if enabled { "true" } else { "false" });
    }

    /// Forward a message from another user to the sink, if allowed
    pub(crate) fn message_received(&self, message: &ChatMessage) {
        if !self.is_sound_enabled() {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.message_received(message);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("sound_enabled", &self.is_sound_enabled())
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}
