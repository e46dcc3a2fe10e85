//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Settings for audio capture.
///
/// The capture sample rate is intentionally absent: the recorder always
/// adopts the device's native rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Maximum recording length in seconds; samples past this are discarded.
    pub max_recording_secs: f32,
    /// Maximum seconds to wait for device acquisition before giving up and
    /// returning the UI to idle.
    pub acquire_timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            max_recording_secs: 120.0,
            acquire_timeout_secs: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// AttemptConfig
// ---------------------------------------------------------------------------

/// Settings for the per-exercise attempt budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptConfig {
    /// How many recordings the user may make per exercise.
    pub budget: i32,
    /// Exercise scope the attempt counter is persisted under.  Changing the
    /// scope (new exercise) starts from a fresh counter.
    pub exercise: String,
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            budget: 3,
            exercise: "default".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// UploadConfig
// ---------------------------------------------------------------------------

/// Settings for submitting a finished recording to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Endpoint the multipart form is POSTed to.
    pub endpoint: String,
    /// Anti-forgery token sent as the `csrfmiddlewaretoken` form field.
    /// `None` omits the field (server without CSRF protection).
    pub csrf_token: Option<String>,
    /// Maximum seconds to wait for the upload before timing out.
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/responses".into(),
            csrf_token: None,
            timeout_secs: 30,
        }
    }
}

// ---------------------------------------------------------------------------
// UiConfig
// ---------------------------------------------------------------------------

/// Window appearance and behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last saved window position `(x, y)` in screen pixels.  `None` means
    /// let the OS / window manager pick a position on first launch.
    pub window_position: Option<(f32, f32)>,
    /// Keep the recorder floating above all other windows.
    pub always_on_top: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_position: None,
            always_on_top: false,
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use response_recorder::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Audio capture settings.
    pub audio: AudioConfig,
    /// Attempt budget settings.
    pub attempts: AttemptConfig,
    /// Upload endpoint settings.
    pub upload: UploadConfig,
    /// Window settings.
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
