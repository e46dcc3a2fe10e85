//! WAV export — raw samples to a waveform-audio byte buffer.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │            WavEncoder (trait)              │
//! │                                            │
//! │   ┌───────────────┐                        │
//! │   │ PcmWavEncoder │  hound → Vec<u8>       │
//! │   └───────┬───────┘                        │
//! │           ▼                                │
//! │   encode(samples, rate) → WAV bytes        │
//! └────────────────────────────────────────────┘
//! ```
//!
//! Output is always **mono 16-bit PCM** at the capture rate.  Encoding is
//! deterministic: equal input yields byte-identical output, so a take can
//! be re-exported without producing a different artifact.
//!
//! # Quick start
//!
//! ```rust
//! use response_recorder::encoder::{PcmWavEncoder, WavEncoder};
//!
//! let samples = vec![0.0_f32; 44_100]; // 1 s of silence
//! let bytes = PcmWavEncoder.encode(&samples, 44_100).unwrap();
//! assert_eq!(&bytes[..4], b"RIFF");
//! ```

pub mod wav;

use thiserror::Error;

pub use wav::PcmWavEncoder;

// ---------------------------------------------------------------------------
// EncodeError
// ---------------------------------------------------------------------------

/// Errors that can arise while exporting a recording.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The recording contained no samples — nothing to export.
    #[error("recording is empty — nothing to export")]
    NoSamples,

    /// The sample rate was zero or otherwise unusable.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// The WAV backend failed mid-write.
    #[error("WAV encoding failed: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// WavEncoder trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for WAV export.
///
/// Implementations must be `Send + Sync` so they can be held behind an
/// `Arc<dyn WavEncoder>` and called from the blocking thread pool.
///
/// # Contract
///
/// - `samples` are mono `f32` PCM in `[-1.0, 1.0]`; out-of-range values are
///   clamped, not wrapped.
/// - Returns `Err(EncodeError::NoSamples)` when `samples` is empty.
/// - Returns `Err(EncodeError::InvalidSampleRate)` when `sample_rate == 0`.
/// - Deterministic: equal `(samples, sample_rate)` input produces
///   byte-identical output.
pub trait WavEncoder: Send + Sync {
    /// Encode `samples` into a complete WAV container.
    fn encode(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, EncodeError>;
}

// Compile-time assertion: Box<dyn WavEncoder> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn WavEncoder>) {}
};

// ---------------------------------------------------------------------------
// MockEncoder  (test-only)
// ---------------------------------------------------------------------------

/// Test double that returns a canned buffer or a canned failure.
#[cfg(test)]
pub struct MockEncoder {
    response: Result<Vec<u8>, String>,
}

#[cfg(test)]
impl MockEncoder {
    /// Always succeed with `bytes`.
    pub fn ok(bytes: &[u8]) -> Self {
        Self {
            response: Ok(bytes.to_vec()),
        }
    }

    /// Always fail with `EncodeError::Backend(message)`.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
        }
    }
}

#[cfg(test)]
impl WavEncoder for MockEncoder {
    fn encode(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        if samples.is_empty() {
            return Err(EncodeError::NoSamples);
        }
        if sample_rate == 0 {
            return Err(EncodeError::InvalidSampleRate(sample_rate));
        }
        match &self.response {
            Ok(bytes) => Ok(bytes.clone()),
            Err(msg) => Err(EncodeError::Backend(msg.clone())),
        }
    }
}
