//! File sink — save a take as `<timestamp>.wav`.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::artifact::Artifact;

use super::{ArtifactSink, SinkError};

/// Writes the artifact into a recordings directory under its own
/// timestamp-derived filename.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Create a sink writing into `dir` (created on first delivery).
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Full path the given artifact would be written to.
    pub fn target_path(&self, artifact: &Artifact) -> PathBuf {
        self.dir.join(&artifact.filename)
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn deliver(&self, artifact: &Artifact) -> Result<(), SinkError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.target_path(artifact);
        std::fs::write(&path, &artifact.bytes)?;
        log::info!(
            "saved {:.1}s recording to {}",
            artifact.duration_secs,
            path.display()
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_artifact_bytes_under_its_filename() {
        let dir = tempdir().expect("temp dir");
        let sink = FileSink::new(dir.path().join("recordings"));
        let artifact = Artifact::new(vec![1, 2, 3, 4, 5], 0.1, 44_100);

        sink.deliver(&artifact).await.unwrap();

        let written = std::fs::read(sink.target_path(&artifact)).unwrap();
        assert_eq!(written, artifact.bytes);
    }

    #[tokio::test]
    async fn creates_missing_directories() {
        let dir = tempdir().expect("temp dir");
        let nested = dir.path().join("a").join("b");
        let sink = FileSink::new(nested.clone());
        let artifact = Artifact::new(vec![9_u8], 0.0, 8_000);

        sink.deliver(&artifact).await.unwrap();
        assert!(nested.join(&artifact.filename).exists());
    }

    #[tokio::test]
    async fn unwritable_directory_surfaces_io_error() {
        // A path under an existing *file* can never be created.
        let dir = tempdir().expect("temp dir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let sink = FileSink::new(blocker.join("sub"));
        let artifact = Artifact::new(vec![9_u8], 0.0, 8_000);

        let result = sink.deliver(&artifact).await;
        assert!(matches!(result, Err(SinkError::Io(_))));
    }
}
