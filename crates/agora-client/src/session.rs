//! Session lifecycle
//!
//! [`ChatSession::connect`] seeds the message log from the REST history
//! endpoint, then spawns a supervisor task that owns the live connection for
//! the rest of the session. The supervisor is the only task that touches the
//! transport and the only writer of chat state; callers talk to it through a
//! [`SessionHandle`].
//!
//! Lifecycle: `Idle -> Connecting -> Connected`, then on loss
//! `WaitingRetry -> Connecting` with a fixed delay, forever. Two endings are
//! final: a ban locks the session (`Locked`, no retry), and a credential
//! rejection returns it to `Idle` (no retry).

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use agora_core::{ChatMessage, ClientFrame, CloseCode, PresenceEntry};

use crate::config::SessionConfig;
use crate::error::ClientError;
use crate::notify::Notifier;
use crate::processor::{ChatState, FrameOutcome, SessionEvent, StreamProcessor};
use crate::rest::ChatApi;
use crate::transport::{SessionTransport, TransportEvent};
use crate::typing::TypingDebouncer;
use crate::voice::{clip_label, VoiceClip};

const EVENT_CAPACITY: usize = 256;
const COMMAND_CAPACITY: usize = 64;

/// How often expired typing indicators are swept
const PRUNE_INTERVAL: Duration = Duration::from_millis(500);

/// Where the supervisor currently is in the connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not running (never started, shut down, or credentials rejected)
    Idle,
    /// A connect attempt is in flight; at most one ever is
    Connecting,
    /// Live stream open
    Connected,
    /// Connection lost; waiting out the fixed retry delay
    WaitingRetry,
    /// Banned; no automatic reconnection will ever run
    Locked,
}

impl SessionState {
    #[must_use]
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }

    /// Whether the supervisor has stopped for good
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Locked
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::WaitingRetry => "waiting_retry",
            Self::Locked => "locked",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
enum Command {
    SendText(String),
    SendVoice(VoiceClip),
    Typing,
    Ping,
    Shutdown,
}

/// Why the connected phase ended
enum ConnectionEnd {
    Banned { reason: String },
    AuthRejected,
    Shutdown,
    Lost,
}

/// Caller-side view of a running session
///
/// Cheap to clone; all clones talk to the same supervisor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state_rx: watch::Receiver<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    shared: Arc<RwLock<ChatState>>,
    api: ChatApi,
    notifier: Arc<Notifier>,
}

impl SessionHandle {
    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Watch lifecycle transitions
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Subscribe to session events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Snapshot of who is online, in arrival order
    #[must_use]
    pub fn roster(&self) -> Vec<PresenceEntry> {
        self.shared.read().roster().entries().to_vec()
    }

    /// Snapshot of the message log, oldest first
    #[must_use]
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.shared.read().log().messages().to_vec()
    }

    /// Names currently typing, self excluded
    #[must_use]
    pub fn typing_users(&self) -> Vec<String> {
        self.shared.read().typing().active(Instant::now())
    }

    /// REST surface bound to this session's credential
    #[must_use]
    pub fn api(&self) -> &ChatApi {
        &self.api
    }

    /// Notification preferences for this session
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Queue a text message for sending
    pub async fn send_text(&self, content: impl Into<String>) -> Result<(), ClientError> {
        self.command(Command::SendText(content.into())).await
    }

    /// Queue a finished voice clip for sending
    pub async fn send_voice(&self, clip: VoiceClip) -> Result<(), ClientError> {
        self.command(Command::SendVoice(clip)).await
    }

    /// Signal local typing; the supervisor debounces the actual frames
    pub async fn notify_typing(&self) -> Result<(), ClientError> {
        self.command(Command::Typing).await
    }

    /// Application-level keepalive
    pub async fn ping(&self) -> Result<(), ClientError> {
        self.command(Command::Ping).await
    }

    /// Stop the session; best effort, idempotent
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown).await;
    }

    async fn command(&self, command: Command) -> Result<(), ClientError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::SessionClosed)
    }
}

/// The supervisor task
pub struct ChatSession {
    config: SessionConfig,
    processor: StreamProcessor,
    debounce: TypingDebouncer,
    commands: mpsc::Receiver<Command>,
    state_tx: watch::Sender<SessionState>,
}

impl ChatSession {
    /// Start a session: fetch recent history, then connect and keep
    /// connected until shut down, banned, or rejected
    ///
    /// A failed history fetch is tolerated; the session starts with an
    /// empty log and still goes live.
    pub async fn connect(config: SessionConfig, notifier: Notifier) -> SessionHandle {
        let shared = Arc::new(RwLock::new(ChatState::new(config.typing_expiry)));
        let notifier = Arc::new(notifier);
        let api = ChatApi::new(&config.api_url, &config.token);

        match api.fetch_history(config.history_limit as usize).await {
            Ok(history) => shared.write().preload_history(history),
            Err(error) => warn!(%error, "history fetch failed, starting with an empty log"),
        }

        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);

        let session = Self {
            processor: StreamProcessor::new(
                Arc::clone(&shared),
                events_tx.clone(),
                Arc::clone(&notifier),
            ),
            debounce: TypingDebouncer::new(config.typing_debounce),
            config,
            commands: command_rx,
            state_tx,
        };
        tokio::spawn(session.run());

        SessionHandle {
            commands: command_tx,
            state_rx,
            events: events_tx,
            shared,
            api,
            notifier,
        }
    }

    async fn run(mut self) {
        loop {
            self.set_state(SessionState::Connecting);
            let transport =
                match SessionTransport::connect(&self.config.ws_url, &self.config.token).await {
                    Ok(transport) => transport,
                    Err(ClientError::Auth) => {
                        warn!("credentials rejected at handshake, not retrying");
                        self.processor.emit(SessionEvent::AuthFailed);
                        self.set_state(SessionState::Idle);
                        return;
                    }
                    Err(error) => {
                        debug!(%error, "connect failed");
                        if !self.wait_retry().await {
                            return;
                        }
                        continue;
                    }
                };

            self.set_state(SessionState::Connected);
            self.debounce.reset();

            match self.drive(transport).await {
                ConnectionEnd::Banned { reason } => {
                    info!(%reason, "session banned, locking");
                    self.processor.emit(SessionEvent::Banned { reason });
                    self.set_state(SessionState::Locked);
                    return;
                }
                ConnectionEnd::AuthRejected => {
                    warn!("connection closed for invalid credentials, not retrying");
                    self.processor.emit(SessionEvent::AuthFailed);
                    self.set_state(SessionState::Idle);
                    return;
                }
                ConnectionEnd::Shutdown => {
                    debug!("session shut down");
                    self.set_state(SessionState::Idle);
                    return;
                }
                ConnectionEnd::Lost => {
                    if !self.wait_retry().await {
                        return;
                    }
                }
            }
        }
    }

    /// One connected phase: pump frames, commands, and the typing sweep
    async fn drive(&mut self, mut transport: SessionTransport) -> ConnectionEnd {
        let mut prune = interval(PRUNE_INTERVAL);
        prune.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                event = transport.next_event() => match event {
                    Some(TransportEvent::Frame(frame)) => {
                        if let FrameOutcome::Banned { reason } =
                            self.processor.apply(frame, Instant::now())
                        {
                            transport.close().await;
                            return ConnectionEnd::Banned { reason };
                        }
                    }
                    Some(TransportEvent::Closed { code, reason }) => {
                        return classify_close(code, reason);
                    }
                    None => return ConnectionEnd::Lost,
                },
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => {
                        transport.close().await;
                        return ConnectionEnd::Shutdown;
                    }
                    Some(command) => {
                        if let Err(error) = self.forward(&mut transport, command).await {
                            debug!(%error, "send failed, reconnecting");
                            return ConnectionEnd::Lost;
                        }
                    }
                },
                _ = prune.tick() => self.processor.prune_typing(Instant::now()),
            }
        }
    }

    async fn forward(
        &mut self,
        transport: &mut SessionTransport,
        command: Command,
    ) -> Result<(), ClientError> {
        match command {
            Command::SendText(content) => transport.send(&ClientFrame::text(content)).await,
            Command::SendVoice(clip) => {
                let frame = ClientFrame::voice(
                    clip_label(clip.duration_seconds()),
                    clip.to_envelope(),
                    clip.duration_seconds(),
                );
                transport.send(&frame).await
            }
            Command::Typing => {
                if self.debounce.should_send(Instant::now()) {
                    transport.send(&ClientFrame::Typing).await
                } else {
                    Ok(())
                }
            }
            Command::Ping => transport.send(&ClientFrame::Ping).await,
            Command::Shutdown => Ok(()),
        }
    }

    /// Sit out the retry delay; returns false if shut down meanwhile
    async fn wait_retry(&mut self) -> bool {
        self.set_state(SessionState::WaitingRetry);
        let delay = sleep(self.config.retry_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                () = &mut delay => return true,
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => {
                        self.set_state(SessionState::Idle);
                        return false;
                    }
                    Some(command) => debug!(?command, "dropping command while disconnected"),
                },
            }
        }
    }

    fn set_state(&self, next: SessionState) {
        if self.state_tx.send_replace(next) != next {
            debug!(state = %next, "session state");
            self.processor.emit(SessionEvent::StateChanged(next));
        }
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("state", &*self.state_tx.borrow())
            .finish_non_exhaustive()
    }
}

/// Map a close to what it means for the lifecycle
///
/// The ban code carries the lock; the auth code ends the session without
/// retry; everything else is a transient loss.
fn classify_close(code: Option<u16>, reason: String) -> ConnectionEnd {
    match code.and_then(CloseCode::from_u16) {
        Some(CloseCode::Banned) => ConnectionEnd::Banned {
            reason: if reason.is_empty() {
                "You have been banned from the chat".to_string()
            } else {
                reason
            },
        },
        Some(CloseCode::AuthFailed) => ConnectionEnd::AuthRejected,
        None => ConnectionEnd::Lost,
    }
}
