//! Gateway state
//!
//! Shared dependencies for the WebSocket and REST handlers.

use std::sync::Arc;

use agora_common::{AppConfig, TokenService};

use crate::assistant::AssistantResponder;
use crate::room::Room;
use crate::store::{BanStore, MessageStore};

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    /// The one chat room and its live connections
    room: Arc<Room>,
    /// Message persistence
    messages: Arc<dyn MessageStore>,
    /// Ban persistence
    bans: Arc<dyn BanStore>,
    /// Credential verification and issuance
    tokens: Arc<TokenService>,
    /// Application configuration
    config: Arc<AppConfig>,
    /// Optional assistant answering mentions
    assistant: Option<Arc<dyn AssistantResponder>>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        messages: Arc<dyn MessageStore>,
        bans: Arc<dyn BanStore>,
        tokens: TokenService,
        config: AppConfig,
    ) -> Self {
        Self {
            room: Arc::new(Room::new()),
            messages,
            bans,
            tokens: Arc::new(tokens),
            config: Arc::new(config),
            assistant: None,
        }
    }

    /// Attach an assistant responder
    #[must_use]
    pub fn with_assistant(mut self, responder: Arc<dyn AssistantResponder>) -> Self {
        self.assistant = Some(responder);
        self
    }

    /// Get the room registry
    pub fn room(&self) -> &Room {
        &self.room
    }

    /// Get the message store
    pub fn messages(&self) -> &dyn MessageStore {
        self.messages.as_ref()
    }

    /// Get the ban store
    pub fn bans(&self) -> &dyn BanStore {
        self.bans.as_ref()
    }

    /// Get the token service
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the assistant responder, if one is attached
    pub fn assistant(&self) -> Option<Arc<dyn AssistantResponder>> {
        self.assistant.clone()
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("room", &self.room)
            .field("assistant", &self.assistant.is_some())
            .finish_non_exhaustive()
    }
}
