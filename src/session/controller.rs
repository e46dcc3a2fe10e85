//! Session controller — drives the record → stop → export → deliver loop.
//!
//! [`SessionController`] owns the [`SharedState`] and responds to
//! [`RecorderCommand`]s received over a `tokio::sync::mpsc` channel.
//!
//! # Session flow
//!
//! ```text
//! RecorderCommand::Start
//!   ├─ reject when a session is active (AlreadyActive)
//!   ├─ reject when no attempts remain (NoAttemptsLeft)
//!   └─▶ clear buffer → Requesting → mic.acquire (blocking pool, bounded
//!       by acquire_timeout_secs)
//!         ├─ granted → Recording, status "Recording..."
//!         └─ denied / timeout → Idle, status cleared
//!
//! RecorderCommand::Stop { destination }
//!   └─▶ drop capture guard (device released) → decrement attempt counter
//!       → Exporting → encoder.encode (blocking pool) → Artifact
//!       → sink.deliver (exactly one sink) → Idle
//!       any failure → Idle with a user-visible message
//!
//! RecorderCommand::NextPrompt
//!   └─▶ reset the attempt counter for the next exercise
//! ```
//!
//! All blocking work (device acquisition, WAV encoding) is pushed onto
//! `tokio::task::spawn_blocking` so the controller task never stalls and a
//! reentrant start can always be answered immediately.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::artifact::Artifact;
use crate::audio::{ActiveCapture, CaptureError, Microphone, SharedSampleBuffer};
use crate::config::AudioConfig;
use crate::encoder::{EncodeError, WavEncoder};
use crate::session::attempts::AttemptCounter;
use crate::sink::{ArtifactSink, Destination, SinkError};

use super::state::{Controls, SessionPhase, SharedState};

// ---------------------------------------------------------------------------
// Commands and events
// ---------------------------------------------------------------------------

/// Commands sent from the UI to the session controller.
#[derive(Debug, Clone, Copy)]
pub enum RecorderCommand {
    /// Begin a new recording session.
    Start,
    /// Stop the active session and deliver the take to `destination`.
    Stop { destination: Destination },
    /// Advance to the next prompt: restore the full attempt budget.
    NextPrompt,
}

/// Results / progress events delivered from the controller to the UI.
#[derive(Debug)]
pub enum RecorderEvent {
    /// The device was granted; samples are flowing at `sample_rate` Hz.
    RecordingStarted { sample_rate: u32 },
    /// Capture stopped; the take is being exported.
    RecordingStopped {
        duration_secs: f32,
        attempts_left: i32,
    },
    /// The take reached its sink.
    Delivered {
        destination: Destination,
        filename: String,
    },
    /// The attempt budget was restored for a new prompt.
    PromptAdvanced { attempts_left: i32 },
    /// A command was rejected or a session step failed.
    Error { error: SessionError },
}

// ---------------------------------------------------------------------------
// SessionError
// ---------------------------------------------------------------------------

/// Errors that can surface from the session controller.
///
/// Every variant carries a human-readable description so the UI can display
/// it without knowing the internal cause.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A start command arrived while a session was in flight.
    #[error("a recording session is already active")]
    AlreadyActive,

    /// A start command arrived with the attempt budget exhausted.
    #[error("no recording attempts left")]
    NoAttemptsLeft,

    /// The input device was denied, absent, or failed to start.
    #[error("microphone unavailable: {0}")]
    AcquisitionDenied(#[from] CaptureError),

    /// Device acquisition did not complete within the configured bound.
    #[error("microphone acquisition timed out after {0} s")]
    AcquisitionTimeout(u64),

    /// The recorded samples could not be encoded.
    #[error("export failed: {0}")]
    Export(#[from] EncodeError),

    /// The artifact could not be delivered to its sink.
    #[error("delivery failed: {0}")]
    Delivery(#[from] SinkError),

    /// Internal / unexpected error (e.g. tokio join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

// ---------------------------------------------------------------------------
// SinkSet
// ---------------------------------------------------------------------------

/// The three delivery backends, one per [`Destination`].
pub struct SinkSet {
    pub playback: Arc<dyn ArtifactSink>,
    pub save: Arc<dyn ArtifactSink>,
    pub upload: Arc<dyn ArtifactSink>,
}

impl SinkSet {
    fn get(&self, destination: Destination) -> &Arc<dyn ArtifactSink> {
        match destination {
            Destination::Playback => &self.playback,
            Destination::Save => &self.save,
            Destination::Upload => &self.upload,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Drives the complete recording session lifecycle.
///
/// Create with [`SessionController::new`], then call [`run`](Self::run)
/// inside a tokio task.  Only one session can be in flight at a time; the
/// controller enforces this explicitly rather than relying on the UI to
/// keep the buttons straight.
pub struct SessionController {
    state: SharedState,
    buffer: SharedSampleBuffer,
    mic: Arc<dyn Microphone>,
    encoder: Arc<dyn WavEncoder>,
    sinks: SinkSet,
    attempts: AttemptCounter,
    audio_cfg: AudioConfig,
    event_tx: mpsc::Sender<RecorderEvent>,
    /// Guard for the live capture; `Some` exactly while recording.
    capture: Option<ActiveCapture>,
}

impl SessionController {
    /// Create a new controller.
    ///
    /// # Arguments
    ///
    /// * `state`     — shared session state (also read by the UI).
    /// * `buffer`    — sample buffer filled by the capture thread.
    /// * `mic`       — device acquisition backend.
    /// * `encoder`   — WAV export backend.
    /// * `sinks`     — the three delivery backends.
    /// * `attempts`  — persisted attempt counter for the current exercise.
    /// * `audio_cfg` — capture limits (acquisition timeout).
    /// * `event_tx`  — channel the UI receives progress events on.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        state: SharedState,
        buffer: SharedSampleBuffer,
        mic: Arc<dyn Microphone>,
        encoder: Arc<dyn WavEncoder>,
        sinks: SinkSet,
        attempts: AttemptCounter,
        audio_cfg: AudioConfig,
        event_tx: mpsc::Sender<RecorderEvent>,
    ) -> Self {
        Self {
            state,
            buffer,
            mic,
            encoder,
            sinks,
            attempts,
            audio_cfg,
            event_tx,
            capture: None,
        }
    }

    // -----------------------------------------------------------------------
    // Main async loop
    // -----------------------------------------------------------------------

    /// Run the controller until `command_rx` is closed.
    ///
    /// This is an `async fn` and should be spawned as a tokio task from
    /// `main()`.  It never returns while the channel is open.
    pub async fn run(mut self, mut command_rx: mpsc::Receiver<RecorderCommand>) {
        while let Some(command) = command_rx.recv().await {
            match command {
                RecorderCommand::Start => self.handle_start().await,
                RecorderCommand::Stop { destination } => self.handle_stop(destination).await,
                RecorderCommand::NextPrompt => self.handle_next().await,
            }
        }

        log::info!("session: command channel closed, controller shutting down");
    }

    // -----------------------------------------------------------------------
    // Start
    // -----------------------------------------------------------------------

    /// Handle a start command: guard, then acquire the device under a
    /// timeout.
    async fn handle_start(&mut self) {
        let active =
            self.capture.is_some() || { self.state.lock().unwrap().phase.is_active() };
        if active {
            log::warn!("session: start rejected — session already active");
            self.emit(RecorderEvent::Error {
                error: SessionError::AlreadyActive,
            })
            .await;
            return;
        }

        if self.attempts.is_exhausted() {
            log::warn!("session: start rejected — no attempts left");
            self.emit(RecorderEvent::Error {
                error: SessionError::NoAttemptsLeft,
            })
            .await;
            return;
        }

        // Leftover samples from a previous session must never leak into a
        // new take.
        let clear_err: Option<String> = match self.buffer.lock() {
            Ok(mut buf) => {
                buf.clear();
                None
            }
            Err(e) => Some(format!("sample buffer lock poisoned: {e}")),
        };
        if let Some(message) = clear_err {
            self.fail(SessionError::Internal(message)).await;
            return;
        }

        {
            let mut st = self.state.lock().unwrap();
            st.phase = SessionPhase::Requesting;
            st.controls = Controls::busy();
        }
        log::debug!("session: Start → Requesting");

        let mic = Arc::clone(&self.mic);
        let buffer = Arc::clone(&self.buffer);
        let timeout_secs = self.audio_cfg.acquire_timeout_secs;

        let acquired = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tokio::task::spawn_blocking(move || mic.acquire(buffer)),
        )
        .await;

        match acquired {
            // Timed out — the late result (if any) is dropped by the
            // runtime, which stops a tardily-granted stream via RAII.
            Err(_) => {
                self.fail_acquisition(SessionError::AcquisitionTimeout(timeout_secs))
                    .await;
            }
            Ok(Err(join_err)) => {
                self.fail_acquisition(SessionError::Internal(join_err.to_string()))
                    .await;
            }
            Ok(Ok(Err(capture_err))) => {
                self.fail_acquisition(SessionError::AcquisitionDenied(capture_err))
                    .await;
            }
            Ok(Ok(Ok(capture))) => {
                let sample_rate = capture.sample_rate();
                self.capture = Some(capture);
                {
                    let mut st = self.state.lock().unwrap();
                    st.phase = SessionPhase::Recording;
                    st.status = "Recording...".into();
                }
                log::info!("session: recording at {sample_rate} Hz");
                self.emit(RecorderEvent::RecordingStarted { sample_rate }).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Handle a stop command: release the device, consume an attempt,
    /// export, and deliver to exactly one sink.
    async fn handle_stop(&mut self, destination: Destination) {
        let Some(capture) = self.capture.take() else {
            log::warn!("session: stop ignored — no active recording");
            return;
        };

        let sample_rate = capture.sample_rate();
        // Dropping the guard stops the hardware stream.
        drop(capture);

        let attempts_left = self.attempts.record_use();
        let status = self.attempts.status_line();

        let drained = match self.buffer.lock() {
            Ok(mut buf) => Ok(buf.drain()),
            Err(e) => Err(format!("sample buffer lock poisoned: {e}")),
        };
        let samples = match drained {
            Ok(s) => s,
            Err(message) => {
                self.fail(SessionError::Internal(message)).await;
                return;
            }
        };
        let duration_secs = samples.len() as f32 / sample_rate as f32;

        {
            let mut st = self.state.lock().unwrap();
            st.phase = SessionPhase::Exporting;
            st.controls = Controls::exporting();
            st.attempts_left = attempts_left;
            st.status = status;
        }
        log::debug!(
            "session: Stop → Exporting ({duration_secs:.1}s, {attempts_left} attempts left)"
        );
        self.emit(RecorderEvent::RecordingStopped {
            duration_secs,
            attempts_left,
        })
        .await;

        // ── Export (blocking → thread pool) ─────────────────────────────
        let encoder = Arc::clone(&self.encoder);
        let export = tokio::task::spawn_blocking(move || encoder.encode(&samples, sample_rate))
            .await;

        let bytes = match export {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                self.fail(SessionError::Export(e)).await;
                return;
            }
            Err(e) => {
                self.fail(SessionError::Internal(e.to_string())).await;
                return;
            }
        };

        let artifact = Artifact::new(bytes, duration_secs, sample_rate);
        log::info!(
            "session: exported {} bytes → {}",
            artifact.len(),
            artifact.filename
        );

        // ── Delivery (exactly one sink) ─────────────────────────────────
        let delivery = self.sinks.get(destination).deliver(&artifact).await;
        match delivery {
            Ok(()) => {
                let filename = artifact.filename.clone();
                {
                    let mut st = self.state.lock().unwrap();
                    st.phase = SessionPhase::Idle;
                    st.controls = Controls::idle(!self.attempts.is_exhausted(), true);
                    st.last_delivery = Some((destination, filename.clone()));
                }
                self.emit(RecorderEvent::Delivered {
                    destination,
                    filename,
                })
                .await;
            }
            Err(e) => {
                self.fail(SessionError::Delivery(e)).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Next prompt
    // -----------------------------------------------------------------------

    /// Handle a next-prompt command: restore the attempt budget.
    async fn handle_next(&mut self) {
        if { self.state.lock().unwrap().phase.is_active() } {
            log::warn!("session: next ignored — session active");
            return;
        }

        self.attempts.reset();
        let attempts_left = self.attempts.remaining();

        {
            let mut st = self.state.lock().unwrap();
            st.attempts_left = attempts_left;
            st.status.clear();
            st.controls = Controls::idle(attempts_left > 0, false);
            st.last_delivery = None;
        }
        log::info!("session: advanced to next prompt ({attempts_left} attempts)");
        self.emit(RecorderEvent::PromptAdvanced { attempts_left }).await;
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn emit(&self, event: RecorderEvent) {
        // Ignore send errors; the UI may have shut down first.
        let _ = self.event_tx.send(event).await;
    }

    /// Acquisition failed: back to idle with the status line *cleared*, the
    /// record button live again, and the error reported as an event.
    async fn fail_acquisition(&mut self, error: SessionError) {
        log::error!("session: acquisition failed: {error}");
        {
            let mut st = self.state.lock().unwrap();
            st.phase = SessionPhase::Idle;
            st.controls =
                Controls::idle(!self.attempts.is_exhausted(), st.last_delivery.is_some());
            st.status.clear();
        }
        self.emit(RecorderEvent::Error { error }).await;
    }

    /// Export or delivery failed: back to idle with the error message in
    /// the status line so the user sees it.
    async fn fail(&mut self, error: SessionError) {
        log::error!("session: {error}");
        {
            let mut st = self.state.lock().unwrap();
            st.phase = SessionPhase::Idle;
            st.controls =
                Controls::idle(!self.attempts.is_exhausted(), st.last_delivery.is_some());
            st.status = error.to_string();
        }
        self.emit(RecorderEvent::Error { error }).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{new_shared_buffer, MockMicrophone};
    use crate::encoder::{MockEncoder, PcmWavEncoder};
    use crate::session::state::new_shared_state;
    use crate::sink::MockSink;
    use crate::store::KvStore;

    // -----------------------------------------------------------------------
    // Harness
    // -----------------------------------------------------------------------

    struct Harness {
        controller: SessionController,
        state: SharedState,
        mic: Arc<MockMicrophone>,
        playback: Arc<MockSink>,
        save: Arc<MockSink>,
        upload: Arc<MockSink>,
        command_tx: mpsc::Sender<RecorderCommand>,
        command_rx: mpsc::Receiver<RecorderCommand>,
        event_rx: mpsc::Receiver<RecorderEvent>,
    }

    fn make_harness_with(
        mic: MockMicrophone,
        encoder: Arc<dyn WavEncoder>,
        budget: i32,
        store_dir: &std::path::Path,
        acquire_timeout_secs: u64,
    ) -> Harness {
        let mic = Arc::new(mic);
        let playback = Arc::new(MockSink::accepting());
        let save = Arc::new(MockSink::accepting());
        let upload = Arc::new(MockSink::accepting());

        let attempts = AttemptCounter::load(KvStore::at(store_dir.to_path_buf()), budget);
        let state = new_shared_state(attempts.remaining());
        let buffer = new_shared_buffer(44_100 * 120);

        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(32);

        let controller = SessionController::new(
            Arc::clone(&state),
            buffer,
            Arc::clone(&mic) as Arc<dyn Microphone>,
            encoder,
            SinkSet {
                playback: Arc::clone(&playback) as Arc<dyn ArtifactSink>,
                save: Arc::clone(&save) as Arc<dyn ArtifactSink>,
                upload: Arc::clone(&upload) as Arc<dyn ArtifactSink>,
            },
            attempts,
            AudioConfig {
                max_recording_secs: 120.0,
                acquire_timeout_secs,
            },
            event_tx,
        );

        Harness {
            controller,
            state,
            mic,
            playback,
            save,
            upload,
            command_tx,
            command_rx,
            event_rx,
        }
    }

    fn make_harness(mic: MockMicrophone, budget: i32, store_dir: &std::path::Path) -> Harness {
        make_harness_with(mic, Arc::new(PcmWavEncoder), budget, store_dir, 10)
    }

    async fn run_commands(harness: Harness, commands: &[RecorderCommand]) -> RunResult {
        let Harness {
            controller,
            state,
            mic,
            playback,
            save,
            upload,
            command_tx,
            command_rx,
            mut event_rx,
            ..
        } = harness;

        for &command in commands {
            command_tx.send(command).await.unwrap();
        }
        drop(command_tx); // close channel so run() returns

        controller.run(command_rx).await;

        let mut events = Vec::new();
        while let Ok(event) = event_rx.try_recv() {
            events.push(event);
        }

        RunResult {
            state,
            mic,
            playback,
            save,
            upload,
            events,
        }
    }

    struct RunResult {
        state: SharedState,
        mic: Arc<MockMicrophone>,
        playback: Arc<MockSink>,
        save: Arc<MockSink>,
        upload: Arc<MockSink>,
        events: Vec<RecorderEvent>,
    }

    impl RunResult {
        fn session(&self) -> crate::session::state::SessionState {
            self.state.lock().unwrap().clone()
        }

        fn errors(&self) -> Vec<&SessionError> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    RecorderEvent::Error { error } => Some(error),
                    _ => None,
                })
                .collect()
        }
    }

    // -----------------------------------------------------------------------
    // Start / acquisition
    // -----------------------------------------------------------------------

    /// Start with a granted device must reach Recording with the right
    /// status text and controls.
    #[tokio::test]
    async fn start_granted_enters_recording() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(2.0, 44_100), 3, dir.path());

        let result = run_commands(harness, &[RecorderCommand::Start]).await;

        let st = result.session();
        assert_eq!(st.phase, SessionPhase::Recording);
        assert_eq!(st.status, "Recording...");
        assert!(!st.controls.record_enabled);
        assert!(st.controls.stop_enabled);
        assert!(st.controls.is_consistent());
        assert!(matches!(
            result.events[0],
            RecorderEvent::RecordingStarted { sample_rate: 44_100 }
        ));
    }

    /// Denied acquisition must reset to Idle: record live, stop dead,
    /// status empty, and no capture guard left alive.
    #[tokio::test]
    async fn start_denied_resets_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::denied(), 3, dir.path());

        let result = run_commands(harness, &[RecorderCommand::Start]).await;

        let st = result.session();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert!(st.controls.record_enabled);
        assert!(!st.controls.stop_enabled);
        assert!(st.status.is_empty());
        assert_eq!(result.mic.alive_captures(), 0);

        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SessionError::AcquisitionDenied(_)));
    }

    /// Acquisition that hangs past the configured timeout must be bounded
    /// and reset to Idle with a timeout error.
    #[tokio::test]
    async fn start_hanging_times_out_and_resets() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness_with(
            MockMicrophone::hanging(Duration::from_secs(2)),
            Arc::new(PcmWavEncoder),
            3,
            dir.path(),
            1,
        );

        let result = run_commands(harness, &[RecorderCommand::Start]).await;

        let st = result.session();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert!(st.controls.record_enabled);
        assert!(st.status.is_empty());

        let errors = result.errors();
        assert!(matches!(errors[0], SessionError::AcquisitionTimeout(1)));
    }

    /// A second start while recording must be rejected with AlreadyActive
    /// and leave the session untouched.
    #[tokio::test]
    async fn reentrant_start_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(1.0, 44_100), 3, dir.path());

        let result =
            run_commands(harness, &[RecorderCommand::Start, RecorderCommand::Start]).await;

        let st = result.session();
        assert_eq!(st.phase, SessionPhase::Recording);
        assert_eq!(st.status, "Recording...");

        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SessionError::AlreadyActive));
    }

    // -----------------------------------------------------------------------
    // Full cycle / delivery
    // -----------------------------------------------------------------------

    /// Property: a full start → stop cycle delivers exactly one artifact to
    /// exactly one sink, with the attempts line reflecting budget − 1.
    #[tokio::test]
    async fn full_cycle_delivers_exactly_one_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(2.0, 44_100), 3, dir.path());

        let result = run_commands(
            harness,
            &[
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Save,
                },
            ],
        )
        .await;

        assert_eq!(result.save.delivery_count(), 1);
        assert_eq!(result.playback.delivery_count(), 0);
        assert_eq!(result.upload.delivery_count(), 0);

        let st = result.session();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert_eq!(st.attempts_left, 2);
        assert_eq!(st.status, "2 attempts left to record");
        assert!(st.controls.record_enabled);
        assert!(!st.controls.stop_enabled);
        assert!(st.controls.next_enabled);
        assert!(st.last_delivery.is_some());
        assert_eq!(result.mic.alive_captures(), 0);

        // Event order: started → stopped → delivered.
        assert!(matches!(result.events[0], RecorderEvent::RecordingStarted { .. }));
        assert!(
            matches!(result.events[1], RecorderEvent::RecordingStopped { attempts_left: 2, .. })
        );
        assert!(matches!(
            result.events[2],
            RecorderEvent::Delivered {
                destination: Destination::Save,
                ..
            }
        ));
    }

    /// The stop destination selects the sink; the other two see nothing.
    #[tokio::test]
    async fn upload_destination_routes_to_upload_sink() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(1.0, 16_000), 3, dir.path());

        let result = run_commands(
            harness,
            &[
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Upload,
                },
            ],
        )
        .await;

        assert_eq!(result.upload.delivery_count(), 1);
        assert_eq!(result.save.delivery_count(), 0);
        assert_eq!(result.playback.delivery_count(), 0);
    }

    /// Stopped duration must reflect the captured samples.
    #[tokio::test]
    async fn stop_reports_capture_duration() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(2.0, 44_100), 3, dir.path());

        let result = run_commands(
            harness,
            &[
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Save,
                },
            ],
        )
        .await;

        let duration = result
            .events
            .iter()
            .find_map(|e| match e {
                RecorderEvent::RecordingStopped { duration_secs, .. } => Some(*duration_secs),
                _ => None,
            })
            .expect("RecordingStopped event");
        assert!((duration - 2.0).abs() < 0.01, "got {duration}");
    }

    /// Stop without an active session is ignored outright.
    #[tokio::test]
    async fn stop_without_start_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(1.0, 44_100), 3, dir.path());

        let result = run_commands(
            harness,
            &[RecorderCommand::Stop {
                destination: Destination::Save,
            }],
        )
        .await;

        assert!(result.events.is_empty());
        assert_eq!(result.session().attempts_left, 3);
        assert_eq!(result.save.delivery_count(), 0);
    }

    // -----------------------------------------------------------------------
    // Attempt gating
    // -----------------------------------------------------------------------

    /// Property: after N cycles the counter reads budget − N and persists.
    #[tokio::test]
    async fn attempts_decrement_per_cycle_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(1.0, 16_000), 3, dir.path());

        let stop = RecorderCommand::Stop {
            destination: Destination::Save,
        };
        let result = run_commands(
            harness,
            &[RecorderCommand::Start, stop, RecorderCommand::Start, stop],
        )
        .await;

        assert_eq!(result.session().attempts_left, 1);
        assert_eq!(result.save.delivery_count(), 2);

        // Simulated restart: a fresh counter on the same store resumes at 1.
        let reloaded =
            AttemptCounter::load(KvStore::at(dir.path().to_path_buf()), 3);
        assert_eq!(reloaded.remaining(), 1);
    }

    /// Property: once the budget is exhausted the record control stays
    /// disabled, and further start commands are rejected with a distinct
    /// error.
    #[tokio::test]
    async fn exhausted_budget_disables_record_permanently() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(1.0, 16_000), 1, dir.path());

        let result = run_commands(
            harness,
            &[
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Save,
                },
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Save,
                },
            ],
        )
        .await;

        let st = result.session();
        assert_eq!(st.attempts_left, 0);
        assert_eq!(st.status, "No attempts left to record");
        assert!(!st.controls.record_enabled);
        assert!(!st.controls.stop_enabled);

        // Only the first cycle delivered; the second start was rejected and
        // the trailing stop ignored.
        assert_eq!(result.save.delivery_count(), 1);
        let errors = result.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], SessionError::NoAttemptsLeft));
    }

    /// NextPrompt restores the budget and persists the reset.
    #[tokio::test]
    async fn next_prompt_restores_budget() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness(MockMicrophone::granting(1.0, 16_000), 2, dir.path());

        let result = run_commands(
            harness,
            &[
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Save,
                },
                RecorderCommand::NextPrompt,
            ],
        )
        .await;

        let st = result.session();
        assert_eq!(st.attempts_left, 2);
        assert!(st.status.is_empty());
        assert!(st.controls.record_enabled);
        assert!(st.last_delivery.is_none());

        let reloaded =
            AttemptCounter::load(KvStore::at(dir.path().to_path_buf()), 2);
        assert_eq!(reloaded.remaining(), 2);
    }

    // -----------------------------------------------------------------------
    // Failure surfacing
    // -----------------------------------------------------------------------

    /// A failing sink must surface a user-visible message and return to
    /// Idle — never a silent success.
    #[tokio::test]
    async fn failed_delivery_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = make_harness(MockMicrophone::granting(1.0, 16_000), 3, dir.path());

        let failing = Arc::new(MockSink::failing("connection refused"));
        harness.controller.sinks.upload = Arc::clone(&failing) as Arc<dyn ArtifactSink>;

        let result = run_commands(
            harness,
            &[
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Upload,
                },
            ],
        )
        .await;

        let st = result.session();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert!(st.status.contains("delivery failed"), "got {:?}", st.status);
        assert!(st.controls.record_enabled);
        assert!(st.last_delivery.is_none());

        let errors = result.errors();
        assert!(matches!(errors[0], SessionError::Delivery(_)));
    }

    /// A failing encoder resets to Idle with a user-visible export message.
    #[tokio::test]
    async fn failed_export_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        let harness = make_harness_with(
            MockMicrophone::granting(1.0, 16_000),
            Arc::new(MockEncoder::failing("disk full")),
            3,
            dir.path(),
            10,
        );

        let result = run_commands(
            harness,
            &[
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Save,
                },
            ],
        )
        .await;

        let st = result.session();
        assert_eq!(st.phase, SessionPhase::Idle);
        assert!(st.status.contains("export failed"), "got {:?}", st.status);
        assert_eq!(result.save.delivery_count(), 0);

        let errors = result.errors();
        assert!(matches!(errors[0], SessionError::Export(_)));
    }

    /// The controls invariant holds at the end of every representative
    /// command sequence.
    #[tokio::test]
    async fn controls_stay_mutually_exclusive() {
        let sequences: Vec<Vec<RecorderCommand>> = vec![
            vec![RecorderCommand::Start],
            vec![
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Playback,
                },
            ],
            vec![
                RecorderCommand::Start,
                RecorderCommand::Start,
                RecorderCommand::Stop {
                    destination: Destination::Save,
                },
                RecorderCommand::NextPrompt,
                RecorderCommand::Start,
            ],
            vec![RecorderCommand::Stop {
                destination: Destination::Upload,
            }],
        ];

        for commands in sequences {
            let dir = tempfile::tempdir().unwrap();
            let harness = make_harness(MockMicrophone::granting(0.5, 16_000), 3, dir.path());
            let result = run_commands(harness, &commands).await;
            assert!(
                result.session().controls.is_consistent(),
                "inconsistent controls after {commands:?}"
            );
        }
    }
}
