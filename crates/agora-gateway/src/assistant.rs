//! Community assistant hook
//!
//! Text messages that mention the assistant are answered in the room by a
//! pluggable [`AssistantResponder`]. The reply runs off the message path:
//! the triggering message broadcasts immediately, a typing indicator shows
//! the assistant at work, and the answer arrives as a regular agent-flagged
//! message.

use async_trait::async_trait;
use tracing::{info, warn};

use agora_core::{ChatMessage, ServerFrame};

use crate::server::GatewayState;

/// Identity the assistant participates under
pub const ASSISTANT_ID: &str = "community-assistant";
pub const ASSISTANT_NAME: &str = "Community Assistant";

/// Mentions that summon the assistant, matched case-insensitively
const TRIGGERS: [&str; 4] = ["@communityassistant", "@assistant", "@bot", "@help"];

/// Shown when the responder fails; the assistant never goes silent after
/// showing a typing indicator
const FALLBACK_REPLY: &str =
    "Sorry, I could not process that right now. Please try again in a moment.";

/// Whatever answers on the assistant's behalf
#[async_trait]
pub trait AssistantResponder: Send + Sync {
    /// Answer a cleaned-up question from `asked_by`
    async fn respond(&self, question: &str, asked_by: &str) -> anyhow::Result<String>;
}

/// Whether a message summons the assistant
#[must_use]
pub fn should_trigger(content: &str) -> bool {
    let lowered = content.to_lowercase();
    TRIGGERS.iter().any(|trigger| lowered.contains(trigger))
}

/// Drop `@mention` tokens so the responder sees only the question
///
/// Falls back to the original content when nothing but mentions remains.
#[must_use]
pub fn strip_mentions(content: &str) -> String {
    let cleaned = content
        .split_whitespace()
        .filter(|word| !word.starts_with('@'))
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() {
        content.to_string()
    } else {
        cleaned
    }
}

/// Answer one triggering message; spawned off the socket task
pub(crate) async fn run(state: GatewayState, question: String, asked_by: String) {
    let Some(responder) = state.assistant() else {
        return;
    };

    state
        .room()
        .broadcast(&ServerFrame::Typing {
            user_id: ASSISTANT_ID.to_string(),
            user_name: ASSISTANT_NAME.to_string(),
        })
        .await;

    let reply = match responder.respond(&question, &asked_by).await {
        Ok(reply) => reply,
        Err(error) => {
            warn!(%error, "assistant responder failed");
            FALLBACK_REPLY.to_string()
        }
    };

    let mut message = ChatMessage::text(ASSISTANT_ID, ASSISTANT_NAME, None, reply);
    message.is_agent = true;

    state.messages().append(message.clone()).await;
    state.room().broadcast(&ServerFrame::Message { message }).await;
    info!(%asked_by, "assistant replied");
}
