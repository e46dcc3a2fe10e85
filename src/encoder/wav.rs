//! Production WAV encoder backed by `hound`.

use std::io::Cursor;

use super::{EncodeError, WavEncoder};

// ---------------------------------------------------------------------------
// PcmWavEncoder
// ---------------------------------------------------------------------------

/// Encodes mono `f32` samples as 16-bit PCM WAV into an in-memory buffer.
///
/// Stateless and trivially `Send + Sync` — one instance can serve every
/// session for the lifetime of the process.
pub struct PcmWavEncoder;

impl PcmWavEncoder {
    /// Convert a normalised `f32` sample to `i16`, clamping out-of-range
    /// input instead of letting it wrap.
    fn to_i16(sample: f32) -> i16 {
        (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
    }
}

impl WavEncoder for PcmWavEncoder {
    fn encode(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        if samples.is_empty() {
            return Err(EncodeError::NoSamples);
        }
        if sample_rate == 0 {
            return Err(EncodeError::InvalidSampleRate(sample_rate));
        }

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| EncodeError::Backend(e.to_string()))?;

            for &sample in samples {
                writer
                    .write_sample(Self::to_i16(sample))
                    .map_err(|e| EncodeError::Backend(e.to_string()))?;
            }

            writer
                .finalize()
                .map_err(|e| EncodeError::Backend(e.to_string()))?;
        }

        Ok(cursor.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
