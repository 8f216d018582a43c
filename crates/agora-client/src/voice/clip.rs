//! Finalized voice clips and their transport envelope

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::encoding::AudioEncoding;

/// Marker separating the MIME label from the payload in an envelope
const ENVELOPE_MARKER: &str = ";base64,";

/// Prefix of every payload envelope
const ENVELOPE_PREFIX: &str = "data:";

/// Errors turning a payload envelope back into a clip
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not an audio envelope")]
    NotAnEnvelope,

    #[error("unsupported audio encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("empty audio payload")]
    EmptyPayload,
}

/// One finalized voice recording
///
/// Immutable once created: the capture side concatenates its chunks exactly
/// once, and playback only ever reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceClip {
    payload: Vec<u8>,
    encoding: AudioEncoding,
    duration: Duration,
}

impl VoiceClip {
    /// Create a clip from already-encoded audio bytes
    #[must_use]
    pub fn new(payload: Vec<u8>, encoding: AudioEncoding, duration: Duration) -> Self {
        Self {
            payload,
            encoding,
            duration,
        }
    }

    /// Encoded audio bytes
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encoding negotiated at capture time
    #[must_use]
    pub fn encoding(&self) -> AudioEncoding {
        self.encoding
    }

    /// Clip length
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Clip length in whole seconds, as carried on the wire
    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration.as_secs() as u32
    }

    /// Serialize into the self-describing text-safe envelope embedded in
    /// `message` frames: `data:<mime>;base64,<payload>`
    #[must_use]
    pub fn to_envelope(&self) -> String {
        format!(
            "{ENVELOPE_PREFIX}{}{ENVELOPE_MARKER}{}",
            self.encoding.mime(),
            BASE64.encode(&self.payload)
        )
    }

    /// Parse an envelope received in a `message` frame
    ///
    /// The envelope does not carry timing; the frame's `audio_duration`
    /// field supplies it.
    pub fn from_envelope(envelope: &str, duration_seconds: u32) -> Result<Self, DecodeError> {
        let body = envelope
            .strip_prefix(ENVELOPE_PREFIX)
            .ok_or(DecodeError::NotAnEnvelope)?;
        let (mime, encoded) = body
            .split_once(ENVELOPE_MARKER)
            .ok_or(DecodeError::NotAnEnvelope)?;

        let encoding = AudioEncoding::from_mime(mime)
            .ok_or_else(|| DecodeError::UnsupportedEncoding(mime.to_string()))?;

        let payload = BASE64.decode(encoded)?;
        if payload.is_empty() {
            return Err(DecodeError::EmptyPayload);
        }

        Ok(Self::new(
            payload,
            encoding,
            Duration::from_secs(u64::from(duration_seconds)),
        ))
    }
}

/// Display label for a voice message, e.g. `Voice message (0:12)`
#[must_use]
pub fn clip_label(duration_seconds: u32) -> String {
    format!(
        "Voice message ({}:{:02})",
        duration_seconds / 60,
        duration_seconds % 60
    )
}
