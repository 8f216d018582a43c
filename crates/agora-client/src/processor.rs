//! Inbound frame dispatch
//!
//! The processor is the only writer of client-side chat state. Frames are
//! applied strictly in arrival order; everything else (handles, UI, tests)
//! reads through the shared lock or listens on the event channel.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use agora_core::{ChatMessage, PresenceEntry, ServerFrame};

use crate::log::MessageLog;
use crate::notify::Notifier;
use crate::roster::PresenceRoster;
use crate::session::SessionState;
use crate::typing::TypingState;

/// Everything a connected session knows about the room
#[derive(Debug)]
pub struct ChatState {
    roster: PresenceRoster,
    log: MessageLog,
    typing: TypingState,
}

impl ChatState {
    #[must_use]
    pub fn new(typing_window: Duration) -> Self {
        Self {
            roster: PresenceRoster::new(),
            log: MessageLog::new(),
            typing: TypingState::new(typing_window),
        }
    }

    /// Who is currently online
    #[must_use]
    pub fn roster(&self) -> &PresenceRoster {
        &self.roster
    }

    /// The ordered message log
    #[must_use]
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Who is currently typing
    #[must_use]
    pub fn typing(&self) -> &TypingState {
        &self.typing
    }

    pub(crate) fn preload_history(&mut self, history: Vec<ChatMessage>) {
        self.log.preload(history);
    }
}

/// Notifications fanned out to session observers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Handshake completed; `user` is the identity the server admitted
    Ready { user: PresenceEntry },
    /// A message was appended to the log
    MessageReceived { message_id: String },
    /// A message in the log was redacted in place
    MessageDeleted { message_id: String },
    /// The roster changed (join, leave, or snapshot reset)
    RosterChanged,
    /// The set of typing users changed
    TypingChanged,
    /// In-band server announcement
    SystemAnnouncement { content: String },
    /// The server rejected the last outbound frame; the session stays up
    Rejected { message: String },
    /// This session was banned; the session is locked
    Banned { reason: String },
    /// Credentials were rejected at the handshake; no retry follows
    AuthFailed,
    /// The supervisor moved to a new connection state
    StateChanged(SessionState),
}

/// What the session loop should do after a frame was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Keep reading
    Continue,
    /// A `banned` frame arrived; stop reading and lock the session
    Banned { reason: String },
}

/// Applies inbound frames to [`ChatState`] and emits [`SessionEvent`]s
pub struct StreamProcessor {
    state: Arc<RwLock<ChatState>>,
    events: broadcast::Sender<SessionEvent>,
    notifier: Arc<Notifier>,
    self_id: Option<String>,
}

impl StreamProcessor {
    #[must_use]
    pub fn new(
        state: Arc<RwLock<ChatState>>,
        events: broadcast::Sender<SessionEvent>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            state,
            events,
            notifier,
            self_id: None,
        }
    }

    /// The user id the server admitted us as, once `connected` has arrived
    #[must_use]
    pub fn self_id(&self) -> Option<&str> {
        self.self_id.as_deref()
    }

    /// Apply one inbound frame
    pub fn apply(&mut self, frame: ServerFrame, now: Instant) -> FrameOutcome {
        match frame {
            ServerFrame::Connected { user, online_users } => {
                debug!(user_id = %user.user_id, online = online_users.len(), "session ready");
                self.self_id = Some(user.user_id.clone());
                self.state.write().roster.reset(online_users);
                self.emit(SessionEvent::Ready { user });
                self.emit(SessionEvent::RosterChanged);
            }
            ServerFrame::Message { message } => {
                if !self.is_self(&message.user_id) {
                    self.notifier.message_received(&message);
                }
                let message_id = message.id.clone();
                self.state.write().log.append(message);
                self.emit(SessionEvent::MessageReceived { message_id });
            }
            ServerFrame::UserJoined { user, .. } => {
                if self.state.write().roster.apply_join(user) {
                    self.emit(SessionEvent::RosterChanged);
                }
            }
            ServerFrame::UserLeft { user_id, .. } => {
                if self.state.write().roster.apply_leave(&user_id) {
                    self.emit(SessionEvent::RosterChanged);
                }
            }
            ServerFrame::MessageDeleted {
                message_id,
                deleted_by,
            } => {
                if self.state.write().log.redact(&message_id, deleted_by) {
                    self.emit(SessionEvent::MessageDeleted { message_id });
                }
            }
            ServerFrame::Typing { user_id, user_name } => {
                if !self.is_self(&user_id) {
                    self.state.write().typing.observe(user_name, now);
                    self.emit(SessionEvent::TypingChanged);
                }
            }
            ServerFrame::Banned { reason, .. } => {
                return FrameOutcome::Banned { reason };
            }
            ServerFrame::System {
                content,
                created_at,
            } => {
                let mut message = ChatMessage::system(content.clone());
                message.created_at = created_at;
                self.state.write().log.append(message);
                self.emit(SessionEvent::SystemAnnouncement { content });
            }
            ServerFrame::Error { message } => {
                debug!(%message, "server rejected a frame");
                self.emit(SessionEvent::Rejected { message });
            }
            ServerFrame::Pong => trace!("pong"),
            ServerFrame::Unknown => trace!("ignoring unknown frame type"),
        }
        FrameOutcome::Continue
    }

    /// Drop expired typing entries; called on a timer by the session loop
    pub fn prune_typing(&self, now: Instant) {
        if self.state.write().typing.prune(now) {
            self.emit(SessionEvent::TypingChanged);
        }
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn is_self(&self, user_id: &str) -> bool {
        self.self_id.as_deref() == Some(user_id)
    }
}

impl std::fmt::Debug for StreamProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamProcessor")
            .field("self_id", &self.self_id)
            .finish_non_exhaustive()
    }
}
