//! Presence endpoint

use axum::extract::State;
use axum::Json;

use agora_core::OnlineUsers;

use crate::server::GatewayState;

/// Get the current roster
///
/// GET /api/chat/online
pub(crate) async fn online(State(state): State<GatewayState>) -> Json<OnlineUsers> {
    Json(OnlineUsers {
        online_users: state.room().snapshot(),
        count: state.room().count(),
    })
}
