//! Audio encoding negotiation
//!
//! Client runtimes support disjoint encoder sets, so the pipeline probes an
//! ordered preference list and records the first supported entry. Nothing
//! downstream may assume a particular codec.

use serde::{Deserialize, Serialize};

/// Audio encodings the protocol knows how to label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AudioEncoding {
    Mp4,
    Aac,
    Mpeg,
    WebmOpus,
    Webm,
    OggOpus,
}

impl AudioEncoding {
    /// Probe order for capture negotiation, most preferred first
    pub const PREFERENCE_ORDER: [Self; 6] = [
        Self::Mp4,
        Self::Aac,
        Self::Mpeg,
        Self::WebmOpus,
        Self::Webm,
        Self::OggOpus,
    ];

    /// Label used when a backend declines every preference
    pub const DEFAULT: Self = Self::Webm;

    /// MIME label carried in the payload envelope
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Mp4 => "audio/mp4",
            Self::Aac => "audio/aac",
            Self::Mpeg => "audio/mpeg",
            Self::WebmOpus => "audio/webm;codecs=opus",
            Self::Webm => "audio/webm",
            Self::OggOpus => "audio/ogg;codecs=opus",
        }
    }

    /// Parse a MIME label back into an encoding
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::PREFERENCE_ORDER
            .into_iter()
            .find(|encoding| encoding.mime() == mime)
    }
}

impl std::fmt::Display for AudioEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

/// Pick the first encoding the backend supports, falling back to
/// [`AudioEncoding::DEFAULT`] when none match
pub fn negotiate(mut supports: impl FnMut(AudioEncoding) -> bool) -> AudioEncoding {
    AudioEncoding::PREFERENCE_ORDER
        .into_iter()
        .find(|&encoding| supports(encoding))
        .unwrap_or(AudioEncoding::DEFAULT)
}
