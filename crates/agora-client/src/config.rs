//! Session configuration

use std::time::Duration;

/// Default delay between reconnect attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(3000);

/// Default window limiting outbound typing frames
pub const DEFAULT_TYPING_DEBOUNCE: Duration = Duration::from_millis(2000);

/// Default lifetime of a remote typing indicator without a refresh
pub const DEFAULT_TYPING_EXPIRY: Duration = Duration::from_millis(3000);

/// Default history page requested before going live
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;

/// Everything a [`crate::ChatSession`] needs to reach the gateway
///
/// The token is the only credential; it rides in the query string of both
/// the WebSocket handshake and the REST collaborator calls.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:8080/ws/chat`
    pub ws_url: String,
    /// REST base, e.g. `http://localhost:8080`
    pub api_url: String,
    /// Bearer credential issued by the platform auth service
    pub token: String,
    /// Fixed delay between reconnect attempts
    pub retry_delay: Duration,
    /// Minimum spacing of outbound typing frames
    pub typing_debounce: Duration,
    /// How long a remote typing indicator lives without a refresh
    pub typing_expiry: Duration,
    /// History page size fetched on cold start
    pub history_limit: u32,
}

impl SessionConfig {
    /// Create a configuration with the default timing knobs
    #[must_use]
    pub fn new(
        ws_url: impl Into<String>,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            ws_url: ws_url.into(),
            api_url: api_url.into(),
            token: token.into(),
            retry_delay: DEFAULT_RETRY_DELAY,
            typing_debounce: DEFAULT_TYPING_DEBOUNCE,
            typing_expiry: DEFAULT_TYPING_EXPIRY,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Override the reconnect delay
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Override the typing debounce window
    #[must_use]
    pub fn with_typing_debounce(mut self, window: Duration) -> Self {
        self.typing_debounce = window;
        self
    }

    /// Override the remote typing expiry window
    #[must_use]
    pub fn with_typing_expiry(mut self, window: Duration) -> Self {
        self.typing_expiry = window;
        self
    }

    /// Override the cold-start history page size
    #[must_use]
    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }
}
