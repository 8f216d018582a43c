//! Message history and deletion endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use agora_common::AppError;
use agora_core::{ChatMessage, ServerFrame, REDACTED_BY_MODERATOR, REDACTED_BY_SENDER};

use crate::error::{ApiError, ApiResult};
use crate::server::GatewayState;

use super::TokenQuery;

const MIN_LIMIT: usize = 1;
const MAX_LIMIT: usize = 100;

/// Query parameters for the history endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct HistoryQuery {
    limit: Option<usize>,
    /// Only messages strictly older than this timestamp
    before: Option<String>,
}

/// Get recent messages in chronological order, deleted ones excluded
///
/// GET /api/chat/messages
pub(crate) async fn history(
    State(state): State<GatewayState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let default_limit = state.config().chat.history_limit as usize;
    let limit = query
        .limit
        .unwrap_or(default_limit)
        .clamp(MIN_LIMIT, MAX_LIMIT);

    let before = match query.before.as_deref() {
        Some(raw) => Some(parse_before(raw)?),
        None => None,
    };

    let messages = state.messages().recent(limit, before).await;
    Ok(Json(messages))
}

fn parse_before(raw: &str) -> Result<DateTime<Utc>, ApiError> {
    raw.parse::<DateTime<Utc>>()
        .map_err(|_| ApiError::invalid_query("`before` must be an RFC 3339 timestamp"))
}

/// Soft-delete a message
///
/// DELETE /api/chat/messages/{message_id}
///
/// Senders may delete their own messages, moderators may delete any. The
/// placeholder left behind says which of the two happened.
pub(crate) async fn delete_message(
    State(state): State<GatewayState>,
    Path(message_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<Value>> {
    let claims = state.tokens().verify(&query.token)?;

    let message = state
        .messages()
        .get(&message_id)
        .await
        .ok_or_else(|| AppError::not_found("Message"))?;

    let is_own = message.user_id == claims.sub;
    if !is_own && !claims.is_admin() {
        return Err(AppError::InsufficientPermissions.into());
    }

    let placeholder = if is_own {
        REDACTED_BY_SENDER
    } else {
        REDACTED_BY_MODERATOR
    };
    state
        .messages()
        .redact(&message_id, placeholder, &claims.sub)
        .await
        .ok_or_else(|| AppError::not_found("Message"))?;

    // Connected clients patch the record in place
    state
        .room()
        .broadcast(&ServerFrame::MessageDeleted {
            message_id: message_id.clone(),
            deleted_by: Some(claims.name.clone()),
        })
        .await;

    tracing::info!(message_id = %message_id, deleted_by = %claims.name, "Message deleted");
    Ok(Json(json!({ "message": "Message deleted" })))
}
