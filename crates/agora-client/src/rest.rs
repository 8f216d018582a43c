//! REST client for the gateway's non-realtime surface
//!
//! History, presence, and moderation actions are plain request/response
//! calls with no protocol state; the live stream stays on the WebSocket.

use serde::Serialize;
use tracing::debug;

use agora_core::{BanRecord, BanStatus, ChatMessage, OnlineUsers};

use crate::error::ClientError;

#[derive(Debug, Serialize)]
struct BanUserRequest<'a> {
    user_id: &'a str,
    reason: &'a str,
    duration_hours: Option<u32>,
}

/// HTTP client bound to one gateway and one credential
#[derive(Debug, Clone)]
pub struct ChatApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ChatApi {
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.into(),
        }
    }

    /// Most recent messages in chronological order, redacted ones excluded
    pub async fn fetch_history(&self, limit: usize) -> Result<Vec<ChatMessage>, ClientError> {
        let messages = self
            .http
            .get(self.endpoint("/api/chat/messages"))
            .query(&[("limit", limit)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ChatMessage>>()
            .await?;
        debug!(count = messages.len(), "history fetched");
        Ok(messages)
    }

    /// Page backwards: messages strictly older than `before`
    pub async fn fetch_history_before(
        &self,
        limit: usize,
        before: &str,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let limit = limit.to_string();
        let messages = self
            .http
            .get(self.endpoint("/api/chat/messages"))
            .query(&[("limit", limit.as_str()), ("before", before)])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<ChatMessage>>()
            .await?;
        Ok(messages)
    }

    /// Who is connected right now
    pub async fn online_users(&self) -> Result<OnlineUsers, ClientError> {
        let online = self
            .http
            .get(self.endpoint("/api/chat/online"))
            .send()
            .await?
            .error_for_status()?
            .json::<OnlineUsers>()
            .await?;
        Ok(online)
    }

    /// Standing of any user, typically checked for oneself before connecting
    pub async fn ban_status(&self, user_id: &str) -> Result<BanStatus, ClientError> {
        let status = self
            .http
            .get(self.endpoint("/api/chat/ban-status"))
            .query(&[("user_id", user_id)])
            .send()
            .await?
            .error_for_status()?
            .json::<BanStatus>()
            .await?;
        Ok(status)
    }

    /// Request a soft delete; the server decides whether we may
    pub async fn delete_message(&self, message_id: &str) -> Result<(), ClientError> {
        self.http
            .delete(self.endpoint(&format!("/api/chat/messages/{message_id}")))
            .query(&[("token", self.token.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Ban a user (admin credential required server-side)
    ///
    /// `duration_hours` of `None` takes the server default.
    pub async fn ban_user(
        &self,
        user_id: &str,
        reason: &str,
        duration_hours: Option<u32>,
    ) -> Result<(), ClientError> {
        self.http
            .post(self.endpoint("/api/chat/ban"))
            .query(&[("token", self.token.as_str())])
            .json(&BanUserRequest {
                user_id,
                reason,
                duration_hours,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Lift a ban early (admin credential required server-side)
    pub async fn unban_user(&self, user_id: &str) -> Result<(), ClientError> {
        self.http
            .delete(self.endpoint(&format!("/api/chat/ban/{user_id}")))
            .query(&[("token", self.token.as_str())])
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// All bans currently in force (admin credential required server-side)
    pub async fn active_bans(&self) -> Result<Vec<BanRecord>, ClientError> {
        let bans = self
            .http
            .get(self.endpoint("/api/chat/bans"))
            .query(&[("token", self.token.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<BanRecord>>()
            .await?;
        Ok(bans)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
