//! Message and ban persistence behind trait seams
//!
//! The gateway only ever talks to [`MessageStore`] and [`BanStore`]; the
//! bundled in-memory implementations keep a single-process deployment (and
//! the test suite) self-contained. Messages age out after a retention
//! window instead of accumulating forever.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::debug;

use agora_core::{BanRecord, ChatMessage};

/// Durable(ish) home of the message log
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a freshly published message
    async fn append(&self, message: ChatMessage);

    /// Most recent messages in chronological order, redacted ones excluded
    ///
    /// `before` pages backwards: only messages strictly older than it.
    async fn recent(&self, limit: usize, before: Option<DateTime<Utc>>) -> Vec<ChatMessage>;

    /// Look up one message by id, redacted or not
    async fn get(&self, message_id: &str) -> Option<ChatMessage>;

    /// Soft-delete in place; returns the patched message if the id exists
    async fn redact(
        &self,
        message_id: &str,
        placeholder: &str,
        deleted_by: &str,
    ) -> Option<ChatMessage>;
}

/// Where bans live
#[async_trait]
pub trait BanStore: Send + Sync {
    /// Record a new ban
    async fn insert(&self, ban: BanRecord);

    /// The ban currently in force for a user, if any
    async fn active_for(&self, user_id: &str) -> Option<BanRecord>;

    /// Lift every ban for a user; returns how many were removed
    async fn remove_for(&self, user_id: &str) -> usize;

    /// All bans currently in force
    async fn active(&self) -> Vec<BanRecord>;
}

/// In-memory message log with time-based retention
pub struct MemoryMessageStore {
    messages: RwLock<Vec<ChatMessage>>,
    retention: Duration,
}

impl MemoryMessageStore {
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            retention,
        }
    }

    fn prune(&self, messages: &mut Vec<ChatMessage>) {
        let cutoff = Utc::now() - self.retention;
        let before = messages.len();
        messages.retain(|m| m.created_at > cutoff);
        let dropped = before - messages.len();
        if dropped > 0 {
            debug!(dropped, "expired messages pruned");
        }
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn append(&self, message: ChatMessage) {
        let mut messages = self.messages.write();
        self.prune(&mut messages);
        messages.push(message);
    }

    async fn recent(&self, limit: usize, before: Option<DateTime<Utc>>) -> Vec<ChatMessage> {
        let messages = self.messages.read();
        let mut page: Vec<ChatMessage> = messages
            .iter()
            .rev()
            .filter(|m| !m.deleted)
            .filter(|m| before.is_none_or(|cut| m.created_at < cut))
            .take(limit)
            .cloned()
            .collect();
        page.reverse();
        page
    }

    async fn get(&self, message_id: &str) -> Option<ChatMessage> {
        self.messages
            .read()
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    async fn redact(
        &self,
        message_id: &str,
        placeholder: &str,
        deleted_by: &str,
    ) -> Option<ChatMessage> {
        let mut messages = self.messages.write();
        let message = messages.iter_mut().find(|m| m.id == message_id)?;
        message.redact(placeholder, Some(deleted_by.to_string()));
        Some(message.clone())
    }
}

impl std::fmt::Debug for MemoryMessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMessageStore")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

/// In-memory ban list; expired bans fall away on read
#[derive(Debug, Default)]
pub struct MemoryBanStore {
    bans: RwLock<Vec<BanRecord>>,
}

impl MemoryBanStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BanStore for MemoryBanStore {
    async fn insert(&self, ban: BanRecord) {
        self.bans.write().push(ban);
    }

    async fn active_for(&self, user_id: &str) -> Option<BanRecord> {
        let now = Utc::now();
        self.bans
            .read()
            .iter()
            .filter(|b| b.user_id == user_id && b.is_active(now))
            .max_by_key(|b| b.expires_at)
            .cloned()
    }

    async fn remove_for(&self, user_id: &str) -> usize {
        let mut bans = self.bans.write();
        let before = bans.len();
        bans.retain(|b| b.user_id != user_id);
        before - bans.len()
    }

    async fn active(&self) -> Vec<BanRecord> {
        let now = Utc::now();
        let mut bans = self.bans.write();
        bans.retain(|b| b.is_active(now));
        bans.clone()
    }
}
