//! REST surface of the gateway
//!
//! All endpoints are mounted under `/api/chat`. History, presence and the
//! ban-status probe are open; deletion and moderation require the caller's
//! token as a query parameter.

mod messages;
mod moderation;
mod presence;

use axum::routing::{delete, get, post};
use axum::Router;
use serde::Deserialize;

use crate::server::GatewayState;

/// Credential carried by the protected endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct TokenQuery {
    pub token: String,
}

/// Create the REST router
pub fn rest_router() -> Router<GatewayState> {
    Router::new().nest("/api/chat", chat_routes())
}

fn chat_routes() -> Router<GatewayState> {
    Router::new()
        .route("/messages", get(messages::history))
        .route("/messages/:message_id", delete(messages::delete_message))
        .route("/online", get(presence::online))
        .route("/ban-status", get(moderation::ban_status))
        .route("/ban", post(moderation::ban_user))
        .route("/ban/:user_id", delete(moderation::unban_user))
        .route("/bans", get(moderation::active_bans))
}
