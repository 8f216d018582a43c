//! Moderation endpoints: bans and the ban-status probe

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use agora_common::AppError;
use agora_core::{BanRecord, BanStatus, CloseCode, ServerFrame};

use crate::error::ApiResult;
use crate::extractors::ValidatedJson;
use crate::server::GatewayState;

use super::TokenQuery;

/// Query parameters for the ban-status probe
#[derive(Debug, Deserialize)]
pub(crate) struct BanStatusQuery {
    user_id: String,
}

/// Request body for banning a user
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BanRequest {
    #[validate(length(min = 1))]
    user_id: String,
    #[validate(length(min = 1, max = 500))]
    reason: String,
    /// Falls back to the configured default when omitted
    duration_hours: Option<u32>,
}

/// Check whether a user is currently banned
///
/// GET /api/chat/ban-status
///
/// Open endpoint: clients probe their own standing before reconnecting.
pub(crate) async fn ban_status(
    State(state): State<GatewayState>,
    Query(query): Query<BanStatusQuery>,
) -> Json<BanStatus> {
    match state.bans().active_for(&query.user_id).await {
        Some(ban) => Json(BanStatus::banned(ban.reason, ban.expires_at)),
        None => Json(BanStatus::clear()),
    }
}

/// Ban a user from the chat
///
/// POST /api/chat/ban
///
/// Admin only. The target gets a personal `banned` frame and a forced
/// disconnect; everyone else sees a system announcement.
pub(crate) async fn ban_user(
    State(state): State<GatewayState>,
    Query(query): Query<TokenQuery>,
    ValidatedJson(request): ValidatedJson<BanRequest>,
) -> ApiResult<Json<Value>> {
    let claims = state.tokens().verify(&query.token)?;
    if !claims.is_admin() {
        return Err(AppError::InsufficientPermissions.into());
    }

    // Admins cannot be banned; the target's role is known when they are
    // online, and self-bans are always rejected
    if request.user_id == claims.sub {
        return Err(AppError::InvalidInput("Cannot ban admin users".to_string()).into());
    }
    let target = state
        .room()
        .snapshot()
        .into_iter()
        .find(|entry| entry.user_id == request.user_id);
    if target.as_ref().is_some_and(agora_core::PresenceEntry::is_admin) {
        return Err(AppError::InvalidInput("Cannot ban admin users".to_string()).into());
    }

    let hours = request
        .duration_hours
        .unwrap_or(state.config().chat.default_ban_hours);
    let now = Utc::now();
    let expires_at = now + Duration::hours(i64::from(hours));

    let ban = BanRecord {
        user_id: request.user_id.clone(),
        user_name: target.as_ref().map(|entry| entry.user_name.clone()),
        banned_by: claims.sub.clone(),
        reason: request.reason.clone(),
        banned_at: now,
        expires_at,
    };
    state.bans().insert(ban).await;

    // Personal notice first, then the forced disconnect
    state
        .room()
        .send_to(
            &request.user_id,
            ServerFrame::Banned {
                reason: request.reason.clone(),
                expires_at: Some(expires_at),
            },
        )
        .await;
    state
        .room()
        .close(
            &request.user_id,
            CloseCode::Banned.as_u16(),
            format!("Banned until {}", expires_at.to_rfc3339()),
        )
        .await;

    let display_name = target
        .map(|entry| entry.user_name)
        .unwrap_or_else(|| request.user_id.clone());
    state
        .room()
        .broadcast(&ServerFrame::system(format!(
            "{display_name} was removed from the chat by a moderator."
        )))
        .await;

    tracing::info!(
        user_id = %request.user_id,
        banned_by = %claims.name,
        hours,
        "User banned"
    );
    Ok(Json(json!({ "message": "User banned", "expires_at": expires_at })))
}

/// Lift all bans for a user
///
/// DELETE /api/chat/ban/{user_id}
pub(crate) async fn unban_user(
    State(state): State<GatewayState>,
    Path(user_id): Path<String>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<Value>> {
    let claims = state.tokens().verify(&query.token)?;
    if !claims.is_admin() {
        return Err(AppError::InsufficientPermissions.into());
    }

    let removed = state.bans().remove_for(&user_id).await;
    if removed == 0 {
        return Err(AppError::not_found("Ban").into());
    }

    tracing::info!(user_id = %user_id, unbanned_by = %claims.name, "User unbanned");
    Ok(Json(json!({ "message": "User unbanned" })))
}

/// List all bans currently in force
///
/// GET /api/chat/bans
pub(crate) async fn active_bans(
    State(state): State<GatewayState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<Json<Vec<BanRecord>>> {
    let claims = state.tokens().verify(&query.token)?;
    if !claims.is_admin() {
        return Err(AppError::InsufficientPermissions.into());
    }

    Ok(Json(state.bans().active().await))
}
