//! Application entry point — voice response recorder.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Load the persisted attempt counter for the configured exercise.
//! 4. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 5. Build the sinks (playback, file save, upload client).
//! 6. Spawn the session controller on the tokio runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;

use response_recorder::{
    app::RecorderApp,
    audio::{new_shared_buffer, CpalMicrophone, Microphone},
    config::{AppConfig, AppPaths},
    encoder::{PcmWavEncoder, WavEncoder},
    session::{
        new_shared_state, AttemptCounter, RecorderCommand, RecorderEvent, SessionController,
        SinkSet,
    },
    sink::{ArtifactSink, FileSink, PlaybackSink, UploadClient},
    store::KvStore,
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([380.0, 200.0])
        .with_min_inner_size([320.0, 160.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("response recorder starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();

    // 3. Attempt counter for the configured exercise scope
    let attempts = AttemptCounter::load(
        KvStore::open_scope(&config.attempts.exercise),
        config.attempts.budget,
    );
    log::info!(
        "exercise {:?}: {} attempt(s) remaining",
        config.attempts.exercise,
        attempts.remaining()
    );

    // 4. Tokio runtime (controller + upload each take a worker)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 5. Shared state, sample buffer, channels, sinks
    let state = new_shared_state(attempts.remaining());

    // Buffer cap sized for 48 kHz devices; a higher-rate device simply hits
    // the recording limit proportionally sooner.
    let buffer = new_shared_buffer((config.audio.max_recording_secs * 48_000.0) as usize);

    let (command_tx, command_rx) = mpsc::channel::<RecorderCommand>(16);
    let (event_tx, event_rx) = mpsc::channel::<RecorderEvent>(32);

    let sinks = SinkSet {
        playback: Arc::new(PlaybackSink) as Arc<dyn ArtifactSink>,
        save: Arc::new(FileSink::new(paths.recordings_dir.clone())) as Arc<dyn ArtifactSink>,
        upload: Arc::new(UploadClient::from_config(&config.upload)) as Arc<dyn ArtifactSink>,
    };

    // 6. Session controller on the tokio runtime
    let controller = SessionController::new(
        Arc::clone(&state),
        buffer,
        Arc::new(CpalMicrophone) as Arc<dyn Microphone>,
        Arc::new(PcmWavEncoder) as Arc<dyn WavEncoder>,
        sinks,
        attempts,
        config.audio.clone(),
        event_tx,
    );
    rt.spawn(controller.run(command_rx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = RecorderApp::new(state, command_tx, event_rx);
    let options = native_options(&config);

    eframe::run_native(
        "Response Recorder",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
