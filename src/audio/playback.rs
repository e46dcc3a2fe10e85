//! Local playback of an exported recording.
//!
//! Decodes a WAV byte buffer with `hound` and plays it through the default
//! output device via `cpal` — the native equivalent of attaching the
//! recording to an audio element for immediate listening.
//!
//! [`play_wav_bytes`] blocks until playback finishes; the playback sink
//! calls it on the blocking thread pool.

use std::io::Cursor;
use std::sync::mpsc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding or playing an artifact.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("artifact is not a valid WAV buffer: {0}")]
    Decode(String),

    #[error("no output device found on the default audio host")]
    NoDevice,

    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// play_wav_bytes
// ---------------------------------------------------------------------------

/// Decode `bytes` as 16-bit PCM WAV and play it to completion.
///
/// The output stream is requested at the artifact's own channel count and
/// sample rate; if the device rejects that configuration the error is
/// surfaced rather than resampled around.
///
/// Blocks the calling thread for the duration of the clip (plus a small
/// drain margin), so call it via `tokio::task::spawn_blocking`.
pub fn play_wav_bytes(bytes: &[u8]) -> Result<(), PlaybackError> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| PlaybackError::Decode(e.to_string()))?;
    let spec = reader.spec();

    let samples: Vec<f32> = reader
        .into_samples::<i16>()
        .map(|s| s.map(|v| f32::from(v) / f32::from(i16::MAX)))
        .collect::<Result<_, _>>()
        .map_err(|e| PlaybackError::Decode(e.to_string()))?;

    if samples.is_empty() {
        return Ok(());
    }

    let clip_len = Duration::from_secs_f64(
        samples.len() as f64 / (f64::from(spec.sample_rate) * f64::from(spec.channels)),
    );

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(PlaybackError::NoDevice)?;

    let config = cpal::StreamConfig {
        channels: spec.channels,
        sample_rate: cpal::SampleRate(spec.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let (done_tx, done_rx) = mpsc::channel::<()>();
    let total = samples.len();
    let mut pos = 0_usize;

    let stream = device.build_output_stream(
        &config,
        move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
            for slot in out.iter_mut() {
                *slot = if pos < total {
                    let s = samples[pos];
                    pos += 1;
                    s
                } else {
                    0.0
                };
            }
            if pos >= total {
                let _ = done_tx.send(());
            }
        },
        |err: cpal::StreamError| {
            log::error!("cpal output stream error: {err}");
        },
        None,
    )?;

    stream.play()?;

    // Wait for the callback to run out of samples; the margin covers device
    // buffering so the tail is not cut off.
    let _ = done_rx.recv_timeout(clip_len + Duration::from_secs(2));

    log::debug!("playback finished ({:.1}s clip)", clip_len.as_secs_f32());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_bytes_are_rejected_as_decode_error() {
        let result = play_wav_bytes(&[0xde, 0xad, 0xbe, 0xef]);
        assert!(matches!(result, Err(PlaybackError::Decode(_))));
    }

    #[test]
    fn empty_buffer_is_rejected_as_decode_error() {
        let result = play_wav_bytes(&[]);
        assert!(matches!(result, Err(PlaybackError::Decode(_))));
    }
}
