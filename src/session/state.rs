//! Session state machine and shared UI state.
//!
//! [`SessionPhase`] drives the controller's state machine.  The UI reads it
//! via [`SharedState`] to decide which controls to enable and what status
//! text to show.
//!
//! [`Controls`] models the enabled/disabled flags of the record, stop and
//! next buttons with one hard invariant: record and stop are never enabled
//! at the same time.
//!
//! [`SharedState`] is a type alias for `Arc<Mutex<SessionState>>` — cheap to
//! clone and safe to share across threads.

use std::sync::{Arc, Mutex};

use crate::sink::Destination;

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// States of a recording session.
///
/// The state machine transitions are:
///
/// ```text
/// Idle ──start──▶ Requesting ──device granted──▶ Recording
///                     │                             │
///                     └──denied / timeout──▶ Idle   │stop
///                                                   ▼
///                                  Idle ◀──delivered/failed── Exporting
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session in flight; the record button is live (attempts permitting).
    Idle,

    /// Waiting for the OS to grant the input device.
    Requesting,

    /// Microphone is live; samples are accumulating in the shared buffer.
    Recording,

    /// Capture has stopped; the take is being encoded and delivered.
    Exporting,
}

impl SessionPhase {
    /// Returns `true` while a session occupies the controller — a new start
    /// is rejected in any of these phases.
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionPhase::Idle)
    }

    /// A short human-readable label suitable for logs and debugging.
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Requesting => "Requesting",
            SessionPhase::Recording => "Recording",
            SessionPhase::Exporting => "Exporting",
        }
    }
}

impl Default for SessionPhase {
    fn default() -> Self {
        SessionPhase::Idle
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Enabled/disabled flags for the three UI controls.
///
/// Invariant: `record_enabled && stop_enabled` is never true.  All
/// constructors uphold it; [`is_consistent`](Self::is_consistent) checks it
/// in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// The record button.
    pub record_enabled: bool,
    /// The stop button.
    pub stop_enabled: bool,
    /// The next-prompt button.
    pub next_enabled: bool,
}

impl Controls {
    /// Controls for the idle phase: record is live only while attempts
    /// remain; stop is dead.
    pub fn idle(has_attempts: bool, next_enabled: bool) -> Self {
        Self {
            record_enabled: has_attempts,
            stop_enabled: false,
            next_enabled,
        }
    }

    /// Controls while a session is being requested or recorded: only stop
    /// is live.
    pub fn busy() -> Self {
        Self {
            record_enabled: false,
            stop_enabled: true,
            next_enabled: false,
        }
    }

    /// Controls while the take is being exported and delivered: everything
    /// is dead until the controller returns to idle.
    pub fn exporting() -> Self {
        Self {
            record_enabled: false,
            stop_enabled: false,
            next_enabled: false,
        }
    }

    /// The mutual-exclusivity invariant.
    pub fn is_consistent(&self) -> bool {
        !(self.record_enabled && self.stop_enabled)
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::idle(true, false)
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Shared session state — the single source of truth for the UI.
///
/// Held behind [`SharedState`] (`Arc<Mutex<SessionState>>`).  The session
/// controller mutates it; the egui update loop reads it each frame.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Current phase of the recording session.
    pub phase: SessionPhase,

    /// Enabled/disabled flags for the UI controls.
    pub controls: Controls,

    /// Status line shown under the controls ("Recording...", attempts left,
    /// or an error message).  Empty when there is nothing to say.
    pub status: String,

    /// Remaining recording attempts for the current exercise.
    pub attempts_left: i32,

    /// Destination and filename of the most recently delivered take.
    ///
    /// `None` until at least one recording has been delivered.
    pub last_delivery: Option<(Destination, String)>,
}

impl SessionState {
    /// Create a fresh state with `attempts_left` remaining attempts.
    pub fn new(attempts_left: i32) -> Self {
        Self {
            phase: SessionPhase::Idle,
            controls: Controls::idle(attempts_left > 0, false),
            status: String::new(),
            attempts_left,
            last_delivery: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SharedState
// ---------------------------------------------------------------------------

/// Thread-safe handle to [`SessionState`].
///
/// Cheap to clone (`Arc` clone).  Lock with `.lock().unwrap()` for a short
/// critical section; do **not** hold the lock across `.await` points.
pub type SharedState = Arc<Mutex<SessionState>>;

/// Construct a new [`SharedState`] with the given remaining attempts.
pub fn new_shared_state(attempts_left: i32) -> SharedState {
    Arc::new(Mutex::new(SessionState::new(attempts_left)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
