//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings + persisted state):
//!   Windows: %APPDATA%\response-recorder\
//!   macOS:   ~/Library/Application Support/response-recorder/
//!   Linux:   ~/.config/response-recorder/
//!
//! Recordings dir (saved takes):
//!   Windows: %USERPROFILE%\Music\response-recorder\  (audio dir)
//!   macOS:   ~/Music/response-recorder/
//!   Linux:   ~/Music/response-recorder/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml` and the state store.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Root of the per-exercise key-value state store.
    pub state_dir: PathBuf,
    /// Directory saved recordings are written into.
    pub recordings_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "response-recorder";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let recordings_dir = dirs::audio_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let state_dir = config_dir.join("state");

        Self {
            config_dir,
            settings_file,
            state_dir,
            recordings_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
