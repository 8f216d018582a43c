//! WebSocket endpoint for the live room connection
//!
//! Each accepted socket gets a task pair: the upgrade task reads client
//! frames, a spawned writer drains the member's outbound queue. The writer
//! exits when the member is evicted from the room (the queue sender is
//! dropped) or when the socket dies.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use agora_core::{
    ChatMessage, ClientFrame, CloseCode, MessageKind, PresenceEntry, ServerFrame, UserRole,
    MAX_AUDIO_PAYLOAD_BYTES, MAX_TEXT_CHARS,
};

use crate::assistant;
use crate::room::{Outbound, OUTBOUND_CAPACITY};

use super::state::GatewayState;

type WsSink = SplitSink<WebSocket, Message>;

/// Credential carried on the upgrade request
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: String,
}

/// Upgrade handler for `/ws/chat`
pub async fn chat_handler(
    State(state): State<GatewayState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket, query.token))
}

/// Drive one socket from handshake to disconnect
async fn handle_socket(state: GatewayState, socket: WebSocket, token: String) {
    let claims = match state.tokens().verify(&token) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::info!(error = %err, "Rejecting connection: invalid token");
            reject(socket, CloseCode::AuthFailed, "Invalid token".to_string()).await;
            return;
        }
    };
    let user = claims.presence();

    if let Some(ban) = state.bans().active_for(&user.user_id).await {
        tracing::info!(
            user_id = %user.user_id,
            expires_at = %ban.expires_at,
            "Rejecting connection: banned"
        );
        let reason = format!("Banned until {}", ban.expires_at.to_rfc3339());
        reject(socket, CloseCode::Banned, reason).await;
        return;
    }

    let session_id = uuid::Uuid::new_v4().to_string();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
    let registration = state.room().join(user.clone(), outbound_tx);
    tracing::info!(
        session_id = %session_id,
        user_id = %user.user_id,
        user_name = %user.user_name,
        online = state.room().count(),
        "User connected"
    );

    let (sink, mut stream) = socket.split();
    let writer = tokio::spawn(write_outbound(sink, outbound_rx));

    // Handshake ack for the new member, then announce them to the room.
    // The joiner receives both; the roster in `connected` already contains
    // them, so the follow-up `user_joined` is an idempotent upsert.
    state
        .room()
        .send_to(
            &user.user_id,
            ServerFrame::Connected {
                user: user.clone(),
                online_users: state.room().snapshot(),
            },
        )
        .await;
    state
        .room()
        .broadcast(&ServerFrame::UserJoined {
            user: user.clone(),
            online_count: state.room().count(),
        })
        .await;

    while let Some(received) = stream.next().await {
        match received {
            Ok(Message::Text(raw)) => handle_frame(&state, &user, &raw).await,
            Ok(Message::Close(_)) => {
                tracing::debug!(user_id = %user.user_id, "Client closed connection");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(user_id = %user.user_id, error = %err, "WebSocket error");
                break;
            }
        }
    }

    // A reconnect replaces the registration; only the departure of the
    // member we registered produces a `user_left`.
    if let Some(entry) = state.room().leave(&user.user_id, registration) {
        tracing::info!(
            session_id = %session_id,
            user_id = %entry.user_id,
            user_name = %entry.user_name,
            online = state.room().count(),
            "User disconnected"
        );
        state
            .room()
            .broadcast(&ServerFrame::UserLeft {
                user_id: entry.user_id,
                user_name: entry.user_name,
                online_count: state.room().count(),
            })
            .await;
    }

    // Leaving dropped the queue sender, so the writer drains and exits.
    let _ = writer.await;
}

/// Close an unaccepted socket with a reserved code
async fn reject(mut socket: WebSocket, code: CloseCode, reason: String) {
    let frame = CloseFrame {
        code: code.as_u16(),
        reason: reason.into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

/// Pump the member's outbound queue into the socket
async fn write_outbound(mut sink: WsSink, mut queue: mpsc::Receiver<Outbound>) {
    while let Some(outbound) = queue.recv().await {
        match outbound {
            Outbound::Frame(frame) => {
                let Ok(payload) = frame.to_json() else { continue };
                if sink.send(Message::Text(payload)).await.is_err() {
                    break;
                }
            }
            Outbound::Close { code, reason } => {
                let frame = CloseFrame {
                    code,
                    reason: reason.into(),
                };
                let _ = sink.send(Message::Close(Some(frame))).await;
                break;
            }
        }
    }
    let _ = sink.close().await;
}

/// Dispatch one inbound frame
async fn handle_frame(state: &GatewayState, user: &PresenceEntry, raw: &str) {
    let frame = match ClientFrame::from_json(raw) {
        Ok(frame) => frame,
        Err(err) => {
            tracing::debug!(user_id = %user.user_id, error = %err, "Dropping unparseable frame");
            return;
        }
    };

    match frame {
        ClientFrame::Message {
            content,
            message_type,
            audio_data,
            audio_duration,
        } => {
            publish_message(state, user, content, message_type, audio_data, audio_duration).await;
        }
        ClientFrame::Typing => {
            state
                .room()
                .broadcast(&ServerFrame::Typing {
                    user_id: user.user_id.clone(),
                    user_name: user.user_name.clone(),
                })
                .await;
        }
        ClientFrame::Ping => {
            state.room().send_to(&user.user_id, ServerFrame::Pong).await;
        }
        ClientFrame::Unknown => {
            tracing::trace!(user_id = %user.user_id, "Ignoring unknown frame");
        }
    }
}

/// Validate, persist and fan out one published message
async fn publish_message(
    state: &GatewayState,
    user: &PresenceEntry,
    content: String,
    message_type: Option<MessageKind>,
    audio_data: Option<String>,
    audio_duration: Option<u32>,
) {
    let content = content.trim().to_string();
    let is_voice = message_type == Some(MessageKind::Audio);

    let payload_ok = if is_voice {
        audio_data
            .as_deref()
            .is_some_and(|payload| !payload.is_empty() && payload.len() <= MAX_AUDIO_PAYLOAD_BYTES)
    } else {
        content.chars().count() <= MAX_TEXT_CHARS
    };
    if content.is_empty() || !payload_ok {
        tracing::warn!(
            user_id = %user.user_id,
            voice = is_voice,
            content_len = content.len(),
            "Rejecting invalid message"
        );
        state
            .room()
            .send_to(
                &user.user_id,
                ServerFrame::error("Invalid message (empty or too long)"),
            )
            .await;
        return;
    }

    // A ban issued mid-session must stop the very next message
    if state.bans().active_for(&user.user_id).await.is_some() {
        state
            .room()
            .send_to(
                &user.user_id,
                ServerFrame::error("You have been banned from the chat"),
            )
            .await;
        return;
    }

    let mut message = if is_voice {
        ChatMessage::voice(
            user.user_id.as_str(),
            user.user_name.as_str(),
            user.avatar.clone(),
            content.as_str(),
            audio_data.unwrap_or_default(),
            audio_duration.unwrap_or(0),
        )
    } else {
        ChatMessage::text(
            user.user_id.as_str(),
            user.user_name.as_str(),
            user.avatar.clone(),
            content.as_str(),
        )
    };
    message.is_admin = user.is_admin();
    message.is_agent = user.role == UserRole::Agent;

    tracing::debug!(
        user_id = %user.user_id,
        message_id = %message.id,
        voice = is_voice,
        "Publishing message"
    );
    state.messages().append(message.clone()).await;
    state.room().broadcast(&ServerFrame::Message { message }).await;

    if !is_voice && assistant::should_trigger(&content) {
        let question = assistant::strip_mentions(&content);
        tokio::spawn(assistant::run(state.clone(), question, user.user_name.clone()));
    }
}
