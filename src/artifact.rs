//! The exported recording artifact.
//!
//! An [`Artifact`] is the immutable result of one completed recording: the
//! WAV-encoded byte buffer plus the metadata the sinks need (filename,
//! duration, sample rate).  Ownership transfers from the session controller
//! to exactly one sink — playback, file save, or upload.

use chrono::{SecondsFormat, Utc};

// ---------------------------------------------------------------------------
// Artifact
// ---------------------------------------------------------------------------

/// One finished recording, ready for delivery.
///
/// Created by the session controller after export and consumed by a single
/// [`crate::sink::ArtifactSink`].  The byte buffer is never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// WAV-encoded audio (mono, 16-bit PCM).
    pub bytes: Vec<u8>,
    /// Filename used for both download and upload, e.g.
    /// `20260808T123456.789Z.wav`.
    pub filename: String,
    /// Length of the recording in seconds.
    pub duration_secs: f32,
    /// Sample rate the audio was captured at (device-native).
    pub sample_rate: u32,
}

impl Artifact {
    /// Build an artifact from encoded bytes, stamping a fresh filename.
    pub fn new(bytes: Vec<u8>, duration_secs: f32, sample_rate: u32) -> Self {
        Self {
            bytes,
            filename: timestamped_filename(),
            duration_secs,
            sample_rate,
        }
    }

    /// Size of the encoded buffer in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the encoded buffer is empty.
    ///
    /// Never the case for an artifact produced by the controller — the
    /// encoder rejects empty recordings.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Filename generation
// ---------------------------------------------------------------------------

/// Generate a `.wav` filename from the current UTC time.
///
/// Uses the ISO-8601 *basic* format (no `:` separators) so the name is valid
/// on every filesystem: `20260808T123456.789Z.wav`.
pub fn timestamped_filename() -> String {
    let stamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(['-', ':'], "");
    format!("{stamp}.wav")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
