//! The single chat room and its connected members
//!
//! Keyed by `user_id`: a user reconnecting replaces their previous
//! registration, and the superseded socket task finds its outbound channel
//! closed. Leaves are guarded by the registration id so a stale cleanup
//! from a replaced connection cannot evict the live one.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use agora_core::{PresenceEntry, ServerFrame};

/// Per-connection outbound queue depth
pub const OUTBOUND_CAPACITY: usize = 64;

/// What a socket task may be told to do
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Deliver a frame
    Frame(ServerFrame),
    /// Send a close frame with this code and stop
    Close { code: u16, reason: String },
}

struct Member {
    registration: u64,
    entry: PresenceEntry,
    sender: mpsc::Sender<Outbound>,
}

/// Registry of live connections
#[derive(Default)]
pub struct Room {
    members: DashMap<String, Member>,
    registrations: AtomicU64,
}

impl Room {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection; an existing registration for the same user is
    /// replaced and its outbound channel dropped
    ///
    /// Returns the registration id to present at [`Room::leave`].
    pub fn join(&self, entry: PresenceEntry, sender: mpsc::Sender<Outbound>) -> u64 {
        let registration = self.registrations.fetch_add(1, Ordering::Relaxed) + 1;
        let previous = self.members.insert(
            entry.user_id.clone(),
            Member {
                registration,
                entry,
                sender,
            },
        );
        if previous.is_some() {
            debug!(registration, "existing connection replaced");
        }
        registration
    }

    /// Deregister, but only if the registration still matches
    ///
    /// Returns the entry that left, or `None` if a newer connection had
    /// already taken the slot.
    pub fn leave(&self, user_id: &str, registration: u64) -> Option<PresenceEntry> {
        let (_, member) = self
            .members
            .remove_if(user_id, |_, member| member.registration == registration)?;
        Some(member.entry)
    }

    /// Whether a user currently holds a registration
    #[must_use]
    pub fn is_online(&self, user_id: &str) -> bool {
        self.members.contains_key(user_id)
    }

    /// Number of connected users
    #[must_use]
    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Roster snapshot in join order
    #[must_use]
    pub fn snapshot(&self) -> Vec<PresenceEntry> {
        let mut members: Vec<(u64, PresenceEntry)> = self
            .members
            .iter()
            .map(|m| (m.registration, m.entry.clone()))
            .collect();
        members.sort_unstable_by_key(|(registration, _)| *registration);
        members.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Deliver a frame to every member
    ///
    /// Members whose socket task is gone are evicted on the way.
    pub async fn broadcast(&self, frame: &ServerFrame) {
        let targets: Vec<(String, u64, mpsc::Sender<Outbound>)> = self
            .members
            .iter()
            .map(|m| (m.key().clone(), m.registration, m.sender.clone()))
            .collect();

        for (user_id, registration, sender) in targets {
            if sender.send(Outbound::Frame(frame.clone())).await.is_err() {
                warn!(%user_id, "dropping member with a dead connection");
                self.leave(&user_id, registration);
            }
        }
    }

    /// Deliver a frame to one member; `false` if they are not connected
    pub async fn send_to(&self, user_id: &str, frame: ServerFrame) -> bool {
        self.dispatch(user_id, Outbound::Frame(frame)).await
    }

    /// Tell one member's socket task to close with a code
    pub async fn close(&self, user_id: &str, code: u16, reason: impl Into<String>) -> bool {
        self.dispatch(
            user_id,
            Outbound::Close {
                code,
                reason: reason.into(),
            },
        )
        .await
    }

    async fn dispatch(&self, user_id: &str, outbound: Outbound) -> bool {
        let sender = self
            .members
            .get(user_id)
            .map(|member| member.sender.clone());
        match sender {
            Some(sender) => sender.send(outbound).await.is_ok(),
            None => false,
        }
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room")
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}
