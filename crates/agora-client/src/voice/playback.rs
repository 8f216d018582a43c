//! Voice message playback behind a pluggable backend

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;

use super::clip::{DecodeError, VoiceClip};
use super::encoding::AudioEncoding;

/// Errors starting playback
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("playback does not support {0}")]
    Unsupported(String),

    #[error("audio output error: {0}")]
    Device(String),
}

/// A playback backend: whatever actually drives the speakers
#[async_trait]
pub trait AudioOutput: Send + Sync {
    /// Whether this backend can decode `encoding`
    fn supports(&self, encoding: AudioEncoding) -> bool;

    /// Begin playing the clip; returns once playback has started
    async fn start(&self, clip: &VoiceClip) -> Result<(), PlaybackError>;
}

/// Entry point for playing received voice messages
#[derive(Clone)]
pub struct Player {
    output: Arc<dyn AudioOutput>,
}

impl Player {
    #[must_use]
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self { output }
    }

    /// Decode an envelope from a `message` frame and start playing it
    ///
    /// An unsupported encoding degrades to an error for this one clip; it
    /// never tears down the session.
    pub async fn play(
        &self,
        audio_data: &str,
        duration_seconds: u32,
    ) -> Result<Playback, PlaybackError> {
        let clip = VoiceClip::from_envelope(audio_data, duration_seconds)?;

        if !self.output.supports(clip.encoding()) {
            return Err(PlaybackError::Unsupported(
                clip.encoding().mime().to_string(),
            ));
        }

        self.output.start(&clip).await?;
        debug!(encoding = %clip.encoding(), secs = duration_seconds, "playback started");
        Ok(Playback::begin(clip.duration()))
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player").finish_non_exhaustive()
    }
}

/// Progress tracker for one playing clip
#[derive(Debug, Clone)]
pub struct Playback {
    duration: Duration,
    started_at: Instant,
}

impl Playback {
    fn begin(duration: Duration) -> Self {
        Self {
            duration,
            started_at: Instant::now(),
        }
    }

    /// Total clip length
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time played so far, capped at the clip length
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    /// Fraction played in `0.0..=1.0`
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress_at(Instant::now())
    }

    /// Fraction played as observed at `now`
    #[must_use]
    pub fn progress_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = self.elapsed_at(now);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Whether the clip has run to the end
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.elapsed() >= self.duration
    }

    fn elapsed_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at).min(self.duration)
    }
}
