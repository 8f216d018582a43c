//! Typing indicators
//!
//! The protocol has no "stopped typing" frame. Senders throttle their
//! outbound signal with [`TypingDebouncer`]; receivers hold each remote
//! indicator in [`TypingState`] and expire it after a fixed window unless a
//! refreshing frame arrives first. The debounce window is shorter than the
//! expiry window, so an actively typing peer stays visible.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Remote typing indicators keyed by display name
#[derive(Debug, Clone)]
pub struct TypingState {
    window: Duration,
    entries: HashMap<String, Instant>,
}

impl TypingState {
    /// Create a state whose entries live `window` after their last refresh
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: HashMap::new(),
        }
    }

    /// Record a typing frame; a repeat for the same user extends the expiry
    /// of the one existing entry
    pub fn observe(&mut self, user_name: impl Into<String>, now: Instant) {
        self.entries.insert(user_name.into(), now + self.window);
    }

    /// Drop expired entries
    ///
    /// Returns `true` if anything was removed.
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        self.entries.len() != before
    }

    /// Names currently typing, sorted for stable rendering
    #[must_use]
    pub fn active(&self, now: Instant) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, expires_at)| **expires_at > now)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    /// Check if nobody is typing
    #[must_use]
    pub fn is_empty(&self, now: Instant) -> bool {
        self.active(now).is_empty()
    }

    /// Drop everything, e.g. when the connection is lost
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Outbound typing throttle
///
/// The first input sends immediately and opens a window; further input
/// inside the window is suppressed. Each sent frame restarts the window, so
/// continuous typing produces one frame per window at most.
#[derive(Debug, Clone)]
pub struct TypingDebouncer {
    window: Duration,
    last_sent: Option<Instant>,
}

impl TypingDebouncer {
    /// Create a debouncer with the given window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_sent: None,
        }
    }

    /// Decide whether this input change should emit a typing frame
    pub fn should_send(&mut self, now: Instant) -> bool {
        let due = self
            .last_sent
            .is_none_or(|sent| now.duration_since(sent) >= self.window);
        if due {
            self.last_sent = Some(now);
        }
        due
    }

    /// Forget the last send, e.g. after a reconnect
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}
