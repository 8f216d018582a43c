//! Presence roster - the live set of connected users
//!
//! Server-authoritative: the roster is rebuilt from the `connected` snapshot
//! and then patched by join/leave frames in arrival order. Entries are keyed
//! by `user_id`; a join for a known user replaces the entry in place, so a
//! reconnecting user never appears twice.

use agora_core::PresenceEntry;

/// Ordered set of currently connected users
#[derive(Debug, Clone, Default)]
pub struct PresenceRoster {
    entries: Vec<PresenceEntry>,
}

impl PresenceRoster {
    /// Create an empty roster
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole roster atomically with a fresh snapshot
    pub fn reset(&mut self, entries: Vec<PresenceEntry>) {
        self.entries = entries;
    }

    /// Apply a join; idempotent per `user_id`
    ///
    /// Returns `true` if the roster changed (new entry or replaced metadata).
    pub fn apply_join(&mut self, entry: PresenceEntry) -> bool {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.user_id == entry.user_id)
        {
            let changed = *existing != entry;
            *existing = entry;
            changed
        } else {
            self.entries.push(entry);
            true
        }
    }

    /// Apply a leave; no-op if the user is absent
    ///
    /// Returns `true` if an entry was removed.
    pub fn apply_leave(&mut self, user_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.user_id != user_id);
        self.entries.len() != before
    }

    /// Look up one entry by id
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<&PresenceEntry> {
        self.entries.iter().find(|e| e.user_id == user_id)
    }

    /// Check if a user is present
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.get(user_id).is_some()
    }

    /// Entries in arrival order
    #[must_use]
    pub fn entries(&self) -> &[PresenceEntry] {
        &self.entries
    }

    /// Current online count
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nobody is connected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
