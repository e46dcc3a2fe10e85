//! Recording session — state machine, attempt gating, and the controller
//! that drives one microphone take from start to delivery.
//!
//! # Architecture
//!
//! ```text
//! RecorderCommand (mpsc)
//!        │
//!        ▼
//! SessionController::run()  ← async tokio task
//!        │
//!        ├─ Start      → Microphone::acquire (timeout-bounded) → Recording
//!        ├─ Stop       → drop capture → AttemptCounter → encode → one sink
//!        └─ NextPrompt → AttemptCounter::reset
//!
//! SharedState (Arc<Mutex<SessionState>>) ←─── read by egui update() each frame
//! ```

pub mod attempts;
pub mod controller;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use attempts::AttemptCounter;
pub use controller::{
    RecorderCommand, RecorderEvent, SessionController, SessionError, SinkSet,
};
pub use state::{new_shared_state, Controls, SessionPhase, SessionState, SharedState};
