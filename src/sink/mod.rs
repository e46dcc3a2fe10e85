//! Artifact delivery — each finished recording goes to exactly one sink.
//!
//! This module provides:
//! * [`ArtifactSink`] — async trait implemented by all delivery backends.
//! * [`PlaybackSink`] — plays the take through the default output device.
//! * [`FileSink`] — writes `<timestamp>.wav` into the recordings directory.
//! * [`UploadClient`] — multipart form POST to the configured endpoint.
//! * [`Destination`] — which of the three the user picked for this take.
//! * [`SinkError`] — error variants for delivery operations.
//!
//! The controller hands each [`Artifact`](crate::artifact::Artifact) to a
//! single sink and surfaces any failure to the user; a failed delivery is
//! never silently logged away.

pub mod playback;
pub mod save;
pub mod upload;

use async_trait::async_trait;
use thiserror::Error;

use crate::artifact::Artifact;
use crate::audio::PlaybackError;

pub use playback::PlaybackSink;
pub use save::FileSink;
pub use upload::UploadClient;

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// Where a finished recording should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Play the take back through the speakers.
    Playback,
    /// Save the take as a timestamped file on disk.
    Save,
    /// Submit the take to the server as a form upload.
    Upload,
}

impl Destination {
    /// A short human-readable label for UI display.
    pub fn label(&self) -> &'static str {
        match self {
            Destination::Playback => "Play back",
            Destination::Save => "Save to disk",
            Destination::Upload => "Upload",
        }
    }
}

// ---------------------------------------------------------------------------
// SinkError
// ---------------------------------------------------------------------------

/// Errors that can occur while delivering an artifact.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Local playback failed (bad buffer or output device trouble).
    #[error("playback failed: {0}")]
    Playback(#[from] PlaybackError),

    /// Writing the recording to disk failed.
    #[error("failed to write recording: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport or connection error during upload.
    #[error("upload request failed: {0}")]
    Request(String),

    /// The upload did not complete within the configured timeout.
    #[error("upload timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("server rejected the upload: HTTP {0}")]
    Rejected(u16),

    /// Internal / unexpected error (e.g. tokio join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for SinkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SinkError::Timeout
        } else if let Some(status) = e.status() {
            SinkError::Rejected(status.as_u16())
        } else {
            SinkError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactSink trait
// ---------------------------------------------------------------------------

/// Async trait for artifact delivery backends.
///
/// Implementors must be `Send + Sync` so they can be shared across threads
/// (e.g. wrapped in `Arc<dyn ArtifactSink>`).  `deliver` consumes the
/// artifact logically, not literally: the controller drops its copy after a
/// successful delivery.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn deliver(&self, artifact: &Artifact) -> Result<(), SinkError>;
}

// Compile-time assertion: Box<dyn ArtifactSink> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ArtifactSink>) {}
};

// ---------------------------------------------------------------------------
// MockSink  (test-only)
// ---------------------------------------------------------------------------

/// Test double that records every delivered filename, or fails on demand.
#[cfg(test)]
pub struct MockSink {
    /// Filenames of artifacts delivered to this sink, in order.
    pub delivered: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
    fail_with: Option<String>,
}

#[cfg(test)]
impl MockSink {
    pub fn accepting() -> Self {
        Self {
            delivered: Default::default(),
            fail_with: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            delivered: Default::default(),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn delivery_count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl ArtifactSink for MockSink {
    async fn deliver(&self, artifact: &Artifact) -> Result<(), SinkError> {
        if let Some(msg) = &self.fail_with {
            return Err(SinkError::Request(msg.clone()));
        }
        self.delivered
            .lock()
            .unwrap()
            .push(artifact.filename.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
