//! Playback sink — immediate listening.

use async_trait::async_trait;

use crate::artifact::Artifact;
use crate::audio::play_wav_bytes;

use super::{ArtifactSink, SinkError};

/// Plays the artifact through the default output device.
///
/// Decoding and playback block for the length of the clip, so the work is
/// pushed onto the blocking thread pool; the controller task stays free to
/// reject reentrant starts while audio is playing.
pub struct PlaybackSink;

#[async_trait]
impl ArtifactSink for PlaybackSink {
    async fn deliver(&self, artifact: &Artifact) -> Result<(), SinkError> {
        let bytes = artifact.bytes.clone();
        let duration = artifact.duration_secs;

        log::info!("playing back {:.1}s recording", duration);

        tokio::task::spawn_blocking(move || play_wav_bytes(&bytes))
            .await
            .map_err(|e| SinkError::Internal(e.to_string()))??;

        Ok(())
    }
}
