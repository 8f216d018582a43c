//! Ordered message log with soft deletion
//!
//! Messages keep the exact order frames arrived in. Deletion never removes
//! an entry; the record is redacted in place so positions and ids stay
//! stable for the whole session.

use agora_core::{ChatMessage, REDACTED_PLACEHOLDER};

/// The session's view of the room history
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
}

impl MessageLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the log with a history page fetched before going live
    pub fn preload(&mut self, history: Vec<ChatMessage>) {
        self.messages = history;
    }

    /// Append one message in arrival order
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Redact the message with the given id in place
    ///
    /// Returns `true` if a message was found; an unknown id is a no-op, the
    /// deletion may refer to history outside the loaded window.
    pub fn redact(&mut self, message_id: &str, deleted_by: Option<String>) -> bool {
        match self.messages.iter_mut().find(|m| m.id == message_id) {
            Some(message) => {
                message.redact(REDACTED_PLACEHOLDER, deleted_by);
                true
            }
            None => false,
        }
    }

    /// Look up one message by id
    #[must_use]
    pub fn get(&self, message_id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == message_id)
    }

    /// Messages in arrival order
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent message
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of entries, redacted ones included
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if no messages have arrived yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
