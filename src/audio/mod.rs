//! Audio capture and playback — microphone → mono downmix → sample buffer,
//! plus local playback of finished recordings.
//!
//! # Pipeline
//!
//! ```text
//! Microphone → cpal callback → AudioChunk (mpsc) → downmix_to_mono
//!           → SampleBuffer (shared) → encoder
//! ```
//!
//! The device is acquired per session through the [`Microphone`] trait; the
//! returned [`ActiveCapture`] guard stops the hardware stream on drop.

pub mod buffer;
pub mod capture;
pub mod downmix;
pub mod microphone;
pub mod playback;

pub use buffer::{new_shared_buffer, SampleBuffer, SharedSampleBuffer};
pub use capture::{AudioCapture, AudioChunk, CaptureError, StreamHandle};
pub use downmix::downmix_to_mono;
pub use microphone::{ActiveCapture, CpalMicrophone, Microphone};
pub use playback::{play_wav_bytes, PlaybackError};

// test-only re-export so the session tests can import MockMicrophone without
// reaching into `audio::microphone` directly.
#[cfg(test)]
pub use microphone::MockMicrophone;
