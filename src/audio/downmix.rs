//! Channel downmixing.
//!
//! The recorder stores and encodes **mono** audio only (a second channel
//! would double the artifact size for no benefit on a spoken response).
//! Capture devices commonly deliver stereo, so every incoming chunk is
//! downmixed at ingest.

/// Mix interleaved multi-channel audio down to mono by averaging all
/// channels per frame.
///
/// The output length is `samples.len() / channels`.
///
/// * If `channels == 1` the input is returned as an owned `Vec` unchanged
///   (fast path — no averaging).
/// * If `channels == 0` an empty vector is returned.
///
/// # Example
///
/// ```rust
/// use response_recorder::audio::downmix_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, -0.2]; // L R L R
/// let mono = downmix_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// assert!((mono[1] - 0.0).abs() < 1e-6);
/// ```
pub fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_passthrough() {
        let mono = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&mono, 1), mono);
    }

    #[test]
    fn stereo_averages_frames() {
        let stereo = vec![1.0_f32, 0.0, 0.5, 0.5];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn four_channels_average() {
        let quad = vec![1.0_f32, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.4];
        let mono = downmix_to_mono(&quad, 4);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 1.0).abs() < 1e-6);
        assert!((mono[1] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn zero_channels_yields_empty() {
        assert!(downmix_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    #[test]
    fn trailing_partial_frame_is_dropped() {
        // 5 samples @ 2 channels → 2 complete frames, 1 orphan dropped
        let data = vec![1.0_f32, 1.0, 2.0, 2.0, 3.0];
        let mono = downmix_to_mono(&data, 2);
        assert_eq!(mono.len(), 2);
    }
}
