//! Voice message tests: capture, wire transfer, playback
//!
//! The audio backends are scripted; everything between them, from the
//! recorder to the gateway and back into the player, is the real thing.
//!
//! Run with: cargo test -p integration-tests --test voice

use std::sync::Arc;

use integration_tests::{
    member, sample_audio, wait_for_event, wait_for_state, wait_until, RecordingOutput,
    ScriptedInput, TestGateway,
};

use agora_client::{AudioEncoding, Player, Recorder, SessionEvent, SessionState, VoiceClip};
use agora_core::MessageKind;

#[tokio::test]
async fn test_voice_clip_travels_end_to_end() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let session_a = gateway.connect(&member("Alice")).await.expect("alice");
    let session_b = gateway.connect(&member("Bob")).await.expect("bob");
    wait_for_state(&session_a, SessionState::Connected)
        .await
        .expect("alice connected");
    wait_for_state(&session_b, SessionState::Connected)
        .await
        .expect("bob connected");

    // Record through a backend that only speaks ogg/opus
    let input = ScriptedInput::new(AudioEncoding::OggOpus, vec![sample_audio()]);
    let recorder = Recorder::new(Arc::new(input));
    assert_eq!(recorder.negotiate_encoding(), AudioEncoding::OggOpus);

    let recording = recorder.start().await.expect("start recording");
    let clip = recording.stop().await.expect("stop recording");
    assert_eq!(clip.payload(), sample_audio().as_slice());
    assert_eq!(clip.encoding(), AudioEncoding::OggOpus);

    let envelope = clip.to_envelope();
    session_a.send_voice(clip).await.expect("send voice");

    wait_until(|| {
        session_b
            .messages()
            .iter()
            .any(|m| m.message_type == MessageKind::Audio)
    })
    .await
    .expect("voice message arrives");

    let log = session_b.messages();
    let message = log
        .iter()
        .find(|m| m.message_type == MessageKind::Audio)
        .expect("audio message");
    assert_eq!(message.audio_data.as_deref(), Some(envelope.as_str()));
    assert_eq!(message.audio_duration, Some(0));
    assert!(message.content.starts_with("Voice message ("));

    // The receiver can decode and play what arrived
    let received = VoiceClip::from_envelope(
        message.audio_data.as_deref().expect("envelope"),
        message.audio_duration.unwrap_or(0),
    )
    .expect("decode");
    assert_eq!(received.payload(), sample_audio().as_slice());
    assert_eq!(received.encoding(), AudioEncoding::OggOpus);

    let output = Arc::new(RecordingOutput::new());
    let player = Player::new(output.clone());
    player
        .play(
            message.audio_data.as_deref().expect("envelope"),
            message.audio_duration.unwrap_or(0),
        )
        .await
        .expect("play");

    let played = output.played();
    assert_eq!(played.len(), 1);
    assert_eq!(played[0].payload(), sample_audio().as_slice());
}

#[tokio::test]
async fn test_oversized_voice_payload_is_rejected() {
    let gateway = TestGateway::start().await.expect("start gateway");

    let session = gateway.connect(&member("Alice")).await.expect("connect");
    wait_for_state(&session, SessionState::Connected)
        .await
        .expect("connected");

    // An envelope just over the payload cap
    let envelope = format!("data:audio/webm;base64,{}", "A".repeat(5_000_004));
    let clip = VoiceClip::from_envelope(&envelope, 30).expect("build clip");

    let mut events = session.subscribe();
    session.send_voice(clip).await.expect("send");

    wait_for_event(&mut events, |event| {
        matches!(event, SessionEvent::Rejected { .. })
    })
    .await
    .expect("rejection");

    // Nothing was stored or broadcast
    assert!(session.messages().is_empty());
    assert_eq!(session.state(), SessionState::Connected);
}
