//! Voice message pipeline
//!
//! Capture: acquire an audio input through the [`AudioInput`] backend trait,
//! accumulate encoded chunks, and finalize them into an immutable
//! [`VoiceClip`]. Transport: the clip serializes to a self-describing
//! base64 envelope carried inside the `message` frame, so the message *is*
//! the audio. Playback mirrors capture through [`AudioOutput`], tracking
//! elapsed/duration and degrading to an unsupported-format result instead
//! of failing the stream.

mod capture;
mod clip;
mod encoding;
mod playback;

pub use capture::{ActiveRecording, AudioInput, CaptureError, CaptureStream, Recorder};
pub use clip::{clip_label, DecodeError, VoiceClip};
pub use encoding::{negotiate, AudioEncoding};
pub use playback::{AudioOutput, Playback, PlaybackError, Player};
