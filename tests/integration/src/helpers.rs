//! Test helpers for integration tests
//!
//! Spawns a real gateway on an ephemeral port, mints tokens the gateway
//! will accept, and connects client sessions through the public API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use agora_client::{ChatSession, Notifier, SessionConfig, SessionEvent, SessionHandle, SessionState};
use agora_common::{
    AppConfig, AppSettings, ChatConfig, Environment, ServerConfig, TokenConfig, TokenService,
};
use agora_core::PresenceEntry;
use agora_gateway::assistant::AssistantResponder;
use agora_gateway::{create_app, create_gateway_state, GatewayState};

/// Secret shared by the test gateway and the token mint
pub const TEST_SECRET: &str = "integration-test-secret-0123456789";

/// Gateway configuration used by the tests
pub fn test_config() -> AppConfig {
    AppConfig {
        app: AppSettings {
            name: "agora-test".to_string(),
            env: Environment::Development,
        },
        gateway: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        token: TokenConfig {
            secret: TEST_SECRET.to_string(),
            expiry: 3600,
        },
        chat: ChatConfig {
            history_limit: 50,
            retention_hours: 48,
            default_ban_hours: 24,
        },
    }
}

/// Running gateway plus an HTTP client aimed at it
///
/// `state` is the same state the server runs on; tests may reach into the
/// stores directly to set up scenarios REST cannot express.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: GatewayState,
    _handle: JoinHandle<()>,
}

impl TestGateway {
    /// Start a gateway with the default test config
    pub async fn start() -> Result<Self> {
        Self::start_with(test_config(), None).await
    }

    /// Start a gateway with an assistant responder attached
    pub async fn start_with_assistant(responder: Arc<dyn AssistantResponder>) -> Result<Self> {
        Self::start_with(test_config(), Some(responder)).await
    }

    async fn start_with(
        config: AppConfig,
        responder: Option<Arc<dyn AssistantResponder>>,
    ) -> Result<Self> {
        let mut state = create_gateway_state(config);
        if let Some(responder) = responder {
            state = state.with_assistant(responder);
        }
        let app = create_app(state.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            state,
            _handle: handle,
        })
    }

    /// REST base URL
    pub fn api_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// WebSocket URL of the chat endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws/chat", self.addr)
    }

    /// Mint a token this gateway will accept
    pub fn issue_token(&self, user: &PresenceEntry) -> Result<String> {
        let tokens = TokenService::new(TEST_SECRET, 3600);
        Ok(tokens.issue(user)?)
    }

    /// Connect a client session for `user`, tuned for fast tests
    pub async fn connect(&self, user: &PresenceEntry) -> Result<SessionHandle> {
        let token = self.issue_token(user)?;
        Ok(self.connect_with_token(&token).await)
    }

    /// Connect a session with an explicit (possibly invalid) token
    pub async fn connect_with_token(&self, token: &str) -> SessionHandle {
        let config = SessionConfig::new(self.ws_url(), self.api_url(), token)
            .with_retry_delay(Duration::from_millis(100))
            .with_typing_debounce(Duration::from_millis(50))
            .with_typing_expiry(Duration::from_millis(400));
        ChatSession::connect(config, Notifier::disabled()).await
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.api_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.api_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.api_url(), path);
        Ok(self.client.delete(&url).send().await?)
    }
}

/// Wait until the session reports `target`, failing after five seconds
pub async fn wait_for_state(handle: &SessionHandle, target: SessionState) -> Result<()> {
    let mut watch = handle.watch_state();
    tokio::time::timeout(Duration::from_secs(5), async move {
        while *watch.borrow_and_update() != target {
            watch.changed().await?;
        }
        Ok::<_, tokio::sync::watch::error::RecvError>(())
    })
    .await
    .map_err(|_| anyhow::anyhow!("session never reached state {target}"))??;
    Ok(())
}

/// Wait for the next session event matching `pred`
///
/// Only events arriving after the subscription are seen; subscribe before
/// triggering the action under test.
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<SessionEvent>,
    mut pred: F,
) -> Result<SessionEvent>
where
    F: FnMut(&SessionEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return Ok(event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => {
                    anyhow::bail!("event stream closed before the expected event")
                }
            }
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("expected event never arrived"))?
}

/// Poll until `check` passes, failing after five seconds
pub async fn wait_until<F>(mut check: F) -> Result<()>
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("condition not met within the timeout");
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    Ok(())
}

/// Assert response status and parse the JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected: StatusCode,
) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if status != expected {
        anyhow::bail!("expected status {expected}, got {status}. Body: {body}");
    }
    Ok(serde_json::from_str(&body)?)
}

/// Assert response status, discarding the body
pub async fn assert_status(response: Response, expected: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected {
        let body = response.text().await?;
        anyhow::bail!("expected status {expected}, got {status}. Body: {body}");
    }
    Ok(())
}
