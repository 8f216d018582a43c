//! Moderation tests: deletion, bans and session lockout
//!
//! Run with: cargo test -p integration-tests --test moderation

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::{json, Value};

use integration_tests::{
    admin, assert_json, assert_status, member, wait_for_event, wait_for_state, wait_until,
    TestGateway,
};

use agora_client::{SessionEvent, SessionState};
use agora_core::{BanRecord, BanStatus, MessageKind};
use reqwest::StatusCode;

// ============================================================================
// Message deletion
// ============================================================================

#[tokio::test]
async fn test_sender_deletes_own_message() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let alice = member("Alice");
    let token = gateway.issue_token(&alice).expect("token");
    let session = gateway.connect(&alice).await.expect("connect");
    wait_for_state(&session, SessionState::Connected)
        .await
        .expect("connected");

    session.send_text("oops").await.expect("send");
    wait_until(|| session.messages().len() == 1)
        .await
        .expect("message lands");
    let message_id = session.messages()[0].id.clone();

    let response = gateway
        .delete(&format!("/api/chat/messages/{message_id}?token={token}"))
        .await
        .expect("delete request");
    let body: Value = assert_json(response, StatusCode::OK).await.expect("body");
    assert_eq!(body["message"], "Message deleted");

    // The live broadcast patches the record in place
    wait_until(|| session.messages()[0].deleted)
        .await
        .expect("record patched");
    let patched = &session.messages()[0];
    assert_eq!(patched.id, message_id);
    assert_eq!(patched.message_type, MessageKind::Deleted);
    assert_eq!(patched.deleted_by.as_deref(), Some("Alice"));
    assert!(patched.audio_data.is_none());

    // History no longer returns it
    let response = gateway.get("/api/chat/messages").await.expect("history");
    let history: Vec<Value> = assert_json(response, StatusCode::OK).await.expect("body");
    assert!(history.is_empty());
}

#[tokio::test]
async fn test_deletion_requires_ownership_or_moderator() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let alice = member("Alice");
    let session = gateway.connect(&alice).await.expect("connect");
    wait_for_state(&session, SessionState::Connected)
        .await
        .expect("connected");

    session.send_text("keep me").await.expect("send");
    wait_until(|| session.messages().len() == 1)
        .await
        .expect("message lands");
    let message_id = session.messages()[0].id.clone();

    // Another member may not delete it
    let bob_token = gateway.issue_token(&member("Bob")).expect("token");
    let response = gateway
        .delete(&format!("/api/chat/messages/{message_id}?token={bob_token}"))
        .await
        .expect("request");
    assert_status(response, StatusCode::FORBIDDEN)
        .await
        .expect("forbidden");
    assert!(!session.messages()[0].deleted);

    // A moderator may; the broadcast carries the moderator's name
    let mod_token = gateway.issue_token(&admin("Mod")).expect("token");
    let response = gateway
        .delete(&format!("/api/chat/messages/{message_id}?token={mod_token}"))
        .await
        .expect("request");
    assert_status(response, StatusCode::OK).await.expect("ok");

    wait_until(|| session.messages()[0].deleted)
        .await
        .expect("record patched");
    assert_eq!(session.messages()[0].deleted_by.as_deref(), Some("Mod"));
}

#[tokio::test]
async fn test_deleting_missing_message_is_not_found() {
    let gateway = TestGateway::start().await.expect("start gateway");
    let token = gateway.issue_token(&member("Alice")).expect("token");

    let response = gateway
        .delete(&format!("/api/chat/messages/no-such-id?token={token}"))
        .await
        .expect("request");
    assert_status(response, StatusCode::NOT_FOUND)
        .await
        .expect("not found");
}

#[tokio::test]
async fn test_deletion_rejects_bad_token() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let response = gateway
        .delete("/api/chat/messages/any?token=garbage")
        .await
        .expect("request");
    assert_status(response, StatusCode::UNAUTHORIZED)
        .await
        .expect("unauthorized");
}

// ============================================================================
// Bans
// ============================================================================

#[tokio::test]
async fn test_ban_locks_the_target_session() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let moderator = admin("Mod");
    let alice = member("Alice");
    let mod_token = gateway.issue_token(&moderator).expect("token");

    let session_m = gateway.connect(&moderator).await.expect("mod connects");
    let session_a = gateway.connect(&alice).await.expect("alice connects");
    wait_for_state(&session_a, SessionState::Connected)
        .await
        .expect("alice connected");
    wait_until(|| session_m.roster().len() == 2)
        .await
        .expect("mod sees alice");

    let mut alice_events = session_a.subscribe();
    let response = gateway
        .post(
            &format!("/api/chat/ban?token={mod_token}"),
            &json!({ "user_id": alice.user_id, "reason": "spam", "duration_hours": 1 }),
        )
        .await
        .expect("ban request");
    let body: Value = assert_json(response, StatusCode::OK).await.expect("body");
    assert_eq!(body["message"], "User banned");
    assert!(body["expires_at"].is_string());

    // The target gets the personal notice and locks; no retry ever runs
    let event = wait_for_event(&mut alice_events, |event| {
        matches!(event, SessionEvent::Banned { .. })
    })
    .await
    .expect("banned event");
    if let SessionEvent::Banned { reason } = event {
        assert_eq!(reason, "spam");
    }
    wait_for_state(&session_a, SessionState::Locked)
        .await
        .expect("alice locked");

    // Everyone else sees the announcement and the departure
    wait_until(|| {
        session_m
            .messages()
            .iter()
            .any(|m| m.is_system() && m.content.contains("Alice"))
    })
    .await
    .expect("system announcement");
    wait_until(|| session_m.roster().len() == 1)
        .await
        .expect("alice off the roster");

    // Standing is visible to anyone who asks
    let response = gateway
        .get(&format!("/api/chat/ban-status?user_id={}", alice.user_id))
        .await
        .expect("status request");
    let status: BanStatus = assert_json(response, StatusCode::OK).await.expect("body");
    assert!(status.banned);
    assert_eq!(status.reason.as_deref(), Some("spam"));

    // Reconnecting is refused at the handshake and locks again
    let retry = gateway.connect(&alice).await.expect("reconnect attempt");
    wait_for_state(&retry, SessionState::Locked)
        .await
        .expect("reconnect locked");
}

#[tokio::test]
async fn test_ban_requires_admin() {
    let gateway = TestGateway::start().await.expect("start gateway");
    let bob_token = gateway.issue_token(&member("Bob")).expect("token");

    let response = gateway
        .post(
            &format!("/api/chat/ban?token={bob_token}"),
            &json!({ "user_id": "someone", "reason": "no" }),
        )
        .await
        .expect("request");
    assert_status(response, StatusCode::FORBIDDEN)
        .await
        .expect("forbidden");

    let response = gateway
        .post(
            "/api/chat/ban?token=garbage",
            &json!({ "user_id": "someone", "reason": "no" }),
        )
        .await
        .expect("request");
    assert_status(response, StatusCode::UNAUTHORIZED)
        .await
        .expect("unauthorized");
}

#[tokio::test]
async fn test_admins_cannot_be_banned() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let first = admin("First");
    let second = admin("Second");
    let first_token = gateway.issue_token(&first).expect("token");

    let session = gateway.connect(&second).await.expect("second connects");
    wait_for_state(&session, SessionState::Connected)
        .await
        .expect("connected");

    let response = gateway
        .post(
            &format!("/api/chat/ban?token={first_token}"),
            &json!({ "user_id": second.user_id, "reason": "turf war" }),
        )
        .await
        .expect("request");
    assert_status(response, StatusCode::BAD_REQUEST)
        .await
        .expect("bad request");

    // Self-bans are rejected the same way
    let response = gateway
        .post(
            &format!("/api/chat/ban?token={first_token}"),
            &json!({ "user_id": first.user_id, "reason": "oops" }),
        )
        .await
        .expect("request");
    assert_status(response, StatusCode::BAD_REQUEST)
        .await
        .expect("bad request");
}

#[tokio::test]
async fn test_unban_restores_access() {
    let gateway = TestGateway::start().await.expect("start gateway");
    let mod_token = gateway.issue_token(&admin("Mod")).expect("token");

    // Bans apply to offline users too
    let response = gateway
        .post(
            &format!("/api/chat/ban?token={mod_token}"),
            &json!({ "user_id": "ghost-1", "reason": "evasion" }),
        )
        .await
        .expect("ban request");
    assert_status(response, StatusCode::OK).await.expect("ok");

    let response = gateway
        .get(&format!("/api/chat/bans?token={mod_token}"))
        .await
        .expect("list request");
    let bans: Vec<BanRecord> = assert_json(response, StatusCode::OK).await.expect("body");
    assert!(bans.iter().any(|ban| ban.user_id == "ghost-1"));

    let response = gateway
        .delete(&format!("/api/chat/ban/ghost-1?token={mod_token}"))
        .await
        .expect("unban request");
    let body: Value = assert_json(response, StatusCode::OK).await.expect("body");
    assert_eq!(body["message"], "User unbanned");

    let response = gateway
        .get("/api/chat/ban-status?user_id=ghost-1")
        .await
        .expect("status request");
    let status: BanStatus = assert_json(response, StatusCode::OK).await.expect("body");
    assert!(!status.banned);

    // Nothing left to lift
    let response = gateway
        .delete(&format!("/api/chat/ban/ghost-1?token={mod_token}"))
        .await
        .expect("second unban");
    assert_status(response, StatusCode::NOT_FOUND)
        .await
        .expect("not found");
}

#[tokio::test]
async fn test_ban_listing_requires_admin() {
    let gateway = TestGateway::start().await.expect("start gateway");
    let bob_token = gateway.issue_token(&member("Bob")).expect("token");

    let response = gateway
        .get(&format!("/api/chat/bans?token={bob_token}"))
        .await
        .expect("request");
    assert_status(response, StatusCode::FORBIDDEN)
        .await
        .expect("forbidden");
}

// ============================================================================
// Rejections on the live stream
// ============================================================================

#[tokio::test]
async fn test_invalid_messages_are_rejected_not_fatal() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let session = gateway.connect(&member("Alice")).await.expect("connect");
    wait_for_state(&session, SessionState::Connected)
        .await
        .expect("connected");

    let mut events = session.subscribe();

    // Whitespace-only trims to empty
    session.send_text("   ").await.expect("send");
    wait_for_event(&mut events, |event| {
        matches!(event, SessionEvent::Rejected { .. })
    })
    .await
    .expect("rejection");

    // Over the text limit
    session.send_text("x".repeat(1001)).await.expect("send");
    wait_for_event(&mut events, |event| {
        matches!(event, SessionEvent::Rejected { .. })
    })
    .await
    .expect("rejection");

    // The connection survived and still works
    assert_eq!(session.state(), SessionState::Connected);
    session.send_text("still here").await.expect("send");
    wait_until(|| session.messages().len() == 1)
        .await
        .expect("valid message lands");
}

#[tokio::test]
async fn test_mid_session_ban_blocks_the_next_message() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let alice = member("Alice");
    let session = gateway.connect(&alice).await.expect("connect");
    wait_for_state(&session, SessionState::Connected)
        .await
        .expect("connected");

    // Record the ban directly in the store: no notice, no forced close,
    // exactly the window between ban and disconnect
    let now = Utc::now();
    gateway
        .state
        .bans()
        .insert(BanRecord {
            user_id: alice.user_id.clone(),
            user_name: Some(alice.user_name.clone()),
            banned_by: "admin-0".to_string(),
            reason: "spam".to_string(),
            banned_at: now,
            expires_at: now + ChronoDuration::hours(1),
        })
        .await;

    let mut events = session.subscribe();
    session.send_text("am i muted?").await.expect("send");

    let event = wait_for_event(&mut events, |event| {
        matches!(event, SessionEvent::Rejected { .. })
    })
    .await
    .expect("rejection");
    if let SessionEvent::Rejected { message } = event {
        assert!(message.contains("banned"));
    }
    assert!(session.messages().is_empty());
}

// ============================================================================
// Credential rejection
// ============================================================================

#[tokio::test]
async fn test_invalid_token_never_retries() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let session = gateway.connect_with_token("not-a-token").await;

    // The supervisor gives up: once it exits, commands fail
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while session.ping().await.is_ok() {
            tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        }
    })
    .await
    .expect("supervisor exits");

    // Rejected credentials end Idle, not Locked
    assert_eq!(session.state(), SessionState::Idle);
}
