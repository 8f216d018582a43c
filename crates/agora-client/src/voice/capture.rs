//! Microphone capture behind a pluggable backend

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::clip::VoiceClip;
use super::encoding::{negotiate, AudioEncoding};

/// Errors from the capture backend
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("microphone permission denied")]
    PermissionDenied,

    #[error("capture backend error: {0}")]
    Backend(String),

    #[error("no audio captured")]
    NoAudioCaptured,
}

/// A capture backend: whatever actually talks to the microphone
///
/// Backends report which encodings their encoder produces and hand out a
/// [`CaptureStream`] of encoded chunks. Releasing the stream must stop
/// capture, flush any final chunk, and close the channel.
#[async_trait]
pub trait AudioInput: Send + Sync {
    /// Whether this backend can encode into `encoding`
    fn supports(&self, encoding: AudioEncoding) -> bool;

    /// Begin capturing in the given encoding
    async fn open(&self, encoding: AudioEncoding) -> Result<CaptureStream, CaptureError>;
}

/// Live stream of encoded audio chunks from a backend
pub struct CaptureStream {
    chunks: mpsc::UnboundedReceiver<Vec<u8>>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl CaptureStream {
    /// Stream with no teardown hook; the backend closes the sender itself
    #[must_use]
    pub fn new(chunks: mpsc::UnboundedReceiver<Vec<u8>>) -> Self {
        Self {
            chunks,
            release: None,
        }
    }

    /// Stream with a teardown hook invoked when capture ends
    #[must_use]
    pub fn with_release(
        chunks: mpsc::UnboundedReceiver<Vec<u8>>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            chunks,
            release: Some(Box::new(release)),
        }
    }

    /// Next encoded chunk, or `None` once the backend has shut down
    pub async fn next_chunk(&mut self) -> Option<Vec<u8>> {
        self.chunks.recv().await
    }

    /// Ask the backend to stop capturing; idempotent
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStream").finish_non_exhaustive()
    }
}

/// Entry point for recording voice messages
#[derive(Clone)]
pub struct Recorder {
    input: Arc<dyn AudioInput>,
}

impl Recorder {
    #[must_use]
    pub fn new(input: Arc<dyn AudioInput>) -> Self {
        Self { input }
    }

    /// Pick the best encoding the backend supports
    #[must_use]
    pub fn negotiate_encoding(&self) -> AudioEncoding {
        negotiate(|encoding| self.input.supports(encoding))
    }

    /// Start a recording; the returned handle accumulates chunks until
    /// stopped or cancelled
    pub async fn start(&self) -> Result<ActiveRecording, CaptureError> {
        let encoding = self.negotiate_encoding();
        let stream = self.input.open(encoding).await?;
        debug!(encoding = %encoding, "recording started");
        Ok(ActiveRecording {
            stream,
            encoding,
            started_at: Instant::now(),
        })
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder").finish_non_exhaustive()
    }
}

/// An in-progress recording
#[derive(Debug)]
pub struct ActiveRecording {
    stream: CaptureStream,
    encoding: AudioEncoding,
    started_at: Instant,
}

impl ActiveRecording {
    /// Encoding chunks are being produced in
    #[must_use]
    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    /// Time since capture began
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Stop capturing and assemble the finished clip
    ///
    /// Releases the backend first so it flushes its final chunk, then drains
    /// the stream to the end.
    pub async fn stop(mut self) -> Result<VoiceClip, CaptureError> {
        self.stream.release();

        let mut payload = Vec::new();
        while let Some(chunk) = self.stream.next_chunk().await {
            payload.extend_from_slice(&chunk);
        }

        if payload.is_empty() {
            return Err(CaptureError::NoAudioCaptured);
        }

        let duration = self.started_at.elapsed();
        debug!(
            bytes = payload.len(),
            secs = duration.as_secs(),
            "recording stopped"
        );
        Ok(VoiceClip::new(payload, self.encoding, duration))
    }

    /// Discard the recording without assembling a clip
    pub fn cancel(mut self) {
        self.stream.release();
        debug!("recording cancelled");
    }
}
