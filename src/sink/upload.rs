//! Upload sink — submit a finished recording to the server.
//!
//! The wire format mirrors a browser form submission: a multipart POST with
//! an `audio_data` file part carrying the WAV bytes, a `filename` text
//! field, and — when configured — a `csrfmiddlewaretoken` anti-forgery
//! field.  All connection details come from [`UploadConfig`]; nothing is
//! hardcoded.
//!
//! Failures are surfaced, not swallowed: a non-2xx status, a timeout, or a
//! transport error all come back as [`SinkError`] so the controller can put
//! a message in front of the user.

use async_trait::async_trait;

use crate::artifact::Artifact;
use crate::config::UploadConfig;

use super::{ArtifactSink, SinkError};

// ---------------------------------------------------------------------------
// UploadClient
// ---------------------------------------------------------------------------

/// Submits recordings to the configured endpoint.
pub struct UploadClient {
    client: reqwest::Client,
    config: UploadConfig,
}

impl UploadClient {
    /// Build an `UploadClient` from application config.
    ///
    /// The HTTP client is pre-configured with the per-request timeout from
    /// `config.timeout_secs`.  A default (no-timeout) client is used as a
    /// last-resort fallback if the builder fails (should never happen in
    /// practice).
    pub fn from_config(config: &UploadConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn build_form(&self, artifact: &Artifact) -> Result<reqwest::multipart::Form, SinkError> {
        let part = reqwest::multipart::Part::bytes(artifact.bytes.clone())
            .file_name(artifact.filename.clone())
            .mime_str("audio/wav")
            .map_err(|e| SinkError::Request(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new()
            .part("audio_data", part)
            .text("filename", artifact.filename.clone());

        // The anti-forgery field is attached only when a token is configured,
        // matching a form rendered without CSRF protection otherwise.
        if let Some(token) = self.config.csrf_token.as_deref() {
            if !token.is_empty() {
                form = form.text("csrfmiddlewaretoken", token.to_string());
            }
        }

        Ok(form)
    }
}

#[async_trait]
impl ArtifactSink for UploadClient {
    /// POST the artifact to the configured endpoint and check the response.
    async fn deliver(&self, artifact: &Artifact) -> Result<(), SinkError> {
        let form = self.build_form(artifact)?;

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Rejected(status.as_u16()));
        }

        // The response body is informational only; log it when it parses.
        match response.json::<serde_json::Value>().await {
            Ok(body) => log::info!("upload accepted: {body}"),
            Err(_) => log::info!("upload accepted (non-JSON response body)"),
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
