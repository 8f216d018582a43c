//! Server assembly
//!
//! One axum application carries three surfaces: the WebSocket endpoint at
//! `/ws/chat`, the REST routes under `/api/chat`, and a health probe.

mod handler;
mod state;

pub use handler::chat_handler;
pub use state::GatewayState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use agora_common::{AppConfig, AppError, TokenService};

use crate::routes;
use crate::store::{MemoryBanStore, MemoryMessageStore};

/// Build the complete application around a prepared state
pub fn create_app(state: GatewayState) -> Router {
    Router::new()
        .route("/ws/chat", get(chat_handler))
        .route("/health", get(health))
        .merge(routes::rest_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

/// Assemble the in-memory stores and shared services
///
/// No assistant is attached here; callers with a responder chain
/// [`GatewayState::with_assistant`] onto the result.
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    let retention = chrono::Duration::hours(i64::from(config.chat.retention_hours));
    let messages = Arc::new(MemoryMessageStore::new(retention));
    let tokens = TokenService::new(&config.token.secret, config.token.expiry);

    GatewayState::new(messages, Arc::new(MemoryBanStore::new()), tokens, config)
}

/// Parse the bind address, then serve until the process stops
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config
        .gateway
        .address()
        .parse::<SocketAddr>()
        .map_err(|e| AppError::Config(format!("Invalid gateway address: {e}")))?;

    let app = create_app(create_gateway_state(config));
    serve(app, addr).await
}

async fn serve(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(%addr, "gateway listening");

    axum::serve(listener, app).await.map_err(AppError::internal)
}
