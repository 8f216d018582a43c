//! Test fixtures and data generators
//!
//! Provides reusable users, assistant responders and audio backends.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use agora_client::{
    AudioEncoding, AudioInput, AudioOutput, CaptureError, CaptureStream, PlaybackError, VoiceClip,
};
use agora_core::{PresenceEntry, UserRole};
use agora_gateway::assistant::AssistantResponder;

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A member with a unique id
pub fn member(name: &str) -> PresenceEntry {
    let suffix = unique_suffix();
    PresenceEntry::new(format!("user-{suffix}"), name, None, UserRole::Member)
}

/// An admin with a unique id
pub fn admin(name: &str) -> PresenceEntry {
    let suffix = unique_suffix();
    PresenceEntry::new(format!("admin-{suffix}"), name, None, UserRole::Admin)
}

/// Responder that prefixes the question with a fixed reply
pub struct ScriptedResponder {
    reply: String,
}

impl ScriptedResponder {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

#[async_trait]
impl AssistantResponder for ScriptedResponder {
    async fn respond(&self, question: &str, _asked_by: &str) -> anyhow::Result<String> {
        Ok(format!("{}: {question}", self.reply))
    }
}

/// Responder that always fails, forcing the fallback reply
pub struct FailingResponder;

#[async_trait]
impl AssistantResponder for FailingResponder {
    async fn respond(&self, _question: &str, _asked_by: &str) -> anyhow::Result<String> {
        anyhow::bail!("responder offline")
    }
}

/// Audio input that yields the given chunks and ends when released
pub struct ScriptedInput {
    encoding: AudioEncoding,
    chunks: Vec<Vec<u8>>,
}

impl ScriptedInput {
    pub fn new(encoding: AudioEncoding, chunks: Vec<Vec<u8>>) -> Self {
        Self { encoding, chunks }
    }
}

#[async_trait]
impl AudioInput for ScriptedInput {
    fn supports(&self, encoding: AudioEncoding) -> bool {
        encoding == self.encoding
    }

    async fn open(&self, _encoding: AudioEncoding) -> Result<CaptureStream, CaptureError> {
        let (tx, rx) = mpsc::unbounded_channel();
        for chunk in &self.chunks {
            let _ = tx.send(chunk.clone());
        }
        // Dropping the sender on release ends the stream
        Ok(CaptureStream::with_release(rx, move || drop(tx)))
    }
}

/// Audio output that records what it was asked to play
#[derive(Default)]
pub struct RecordingOutput {
    played: Mutex<Vec<VoiceClip>>,
}

impl RecordingOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<VoiceClip> {
        self.played.lock().clone()
    }
}

#[async_trait]
impl AudioOutput for RecordingOutput {
    fn supports(&self, _encoding: AudioEncoding) -> bool {
        true
    }

    async fn start(&self, clip: &VoiceClip) -> Result<(), PlaybackError> {
        self.played.lock().push(clip.clone());
        Ok(())
    }
}

/// Small recognizable payload for voice tests
pub fn sample_audio() -> Vec<u8> {
    vec![0x4f, 0x67, 0x67, 0x53, 0x00, 0x01, 0x02, 0x03]
}
