//! Response recorder window — egui/eframe application.
//!
//! # Architecture
//!
//! [`RecorderApp`] is the top-level [`eframe::App`].  It owns:
//!
//! * `command_tx` — sends [`RecorderCommand`] to the session controller.
//! * `event_rx`  — receives [`RecorderEvent`] progress from the controller.
//! * a clone of the [`SharedState`] the controller mutates; the update loop
//!   reads it every frame to decide which buttons are live and what the
//!   status line says.
//!
//! The state is authoritative for controls and status; events are used only
//! for transient notices (rejections and failures that the controller
//! reports without leaving a message in the status line).

use eframe::egui;
use tokio::sync::mpsc;

use crate::session::{RecorderCommand, RecorderEvent, SharedState};
use crate::sink::Destination;

// ---------------------------------------------------------------------------
// RecorderApp
// ---------------------------------------------------------------------------

/// eframe application — the recorder window.
pub struct RecorderApp {
    /// Shared session state, mutated by the controller.
    state: SharedState,
    /// Send commands to the background session controller.
    command_tx: mpsc::Sender<RecorderCommand>,
    /// Receive progress events from the controller.
    event_rx: mpsc::Receiver<RecorderEvent>,
    /// Destination the next stop will deliver to.
    destination: Destination,
    /// Transient notice shown under the status line (last rejection or
    /// failure).  Cleared when the next session starts cleanly.
    notice: Option<String>,
}

impl RecorderApp {
    /// Create a new [`RecorderApp`].
    ///
    /// * `state`      — shared session state (also mutated by the controller).
    /// * `command_tx` — sender end of the command channel.
    /// * `event_rx`   — receiver end of the event channel.
    pub fn new(
        state: SharedState,
        command_tx: mpsc::Sender<RecorderCommand>,
        event_rx: mpsc::Receiver<RecorderEvent>,
    ) -> Self {
        Self {
            state,
            command_tx,
            event_rx,
            destination: Destination::Playback,
            notice: None,
        }
    }

    // ── Channel polling ──────────────────────────────────────────────────

    /// Drain all pending controller events (non-blocking).
    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                RecorderEvent::RecordingStarted { .. } => {
                    self.notice = None;
                }
                RecorderEvent::Delivered {
                    destination,
                    filename,
                } => {
                    log::info!("delivered via {}: {filename}", destination.label());
                    self.notice = None;
                }
                RecorderEvent::Error { error } => {
                    self.notice = Some(error.to_string());
                }
                RecorderEvent::RecordingStopped { .. }
                | RecorderEvent::PromptAdvanced { .. } => {
                    // Controls and status come from the shared state.
                }
            }
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────────

/// try_send: the UI must never block on the controller; a full queue just
/// drops the click.
fn send(command_tx: &mpsc::Sender<RecorderCommand>, command: RecorderCommand) {
    if command_tx.try_send(command).is_err() {
        log::warn!("command channel full — ignoring {command:?}");
    }
}

impl eframe::App for RecorderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events();

        let snapshot = self.state.lock().unwrap().clone();
        let command_tx = self.command_tx.clone();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Response Recorder");
            ui.add_space(6.0);

            // ── Transport controls ──────────────────────────────────────
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(
                        snapshot.controls.record_enabled,
                        egui::Button::new("● Record"),
                    )
                    .clicked()
                {
                    send(&command_tx, RecorderCommand::Start);
                }

                if ui
                    .add_enabled(snapshot.controls.stop_enabled, egui::Button::new("■ Stop"))
                    .clicked()
                {
                    send(
                        &command_tx,
                        RecorderCommand::Stop {
                            destination: self.destination,
                        },
                    );
                }

                if ui
                    .add_enabled(snapshot.controls.next_enabled, egui::Button::new("Next ▶"))
                    .clicked()
                {
                    send(&command_tx, RecorderCommand::NextPrompt);
                }
            });

            ui.add_space(6.0);

            // ── Destination picker ──────────────────────────────────────
            ui.horizontal(|ui| {
                ui.label("On stop:");
                for destination in [Destination::Playback, Destination::Save, Destination::Upload]
                {
                    ui.radio_value(&mut self.destination, destination, destination.label());
                }
            });

            ui.add_space(8.0);

            // ── Status ──────────────────────────────────────────────────
            if !snapshot.status.is_empty() {
                ui.label(&snapshot.status);
            }

            if let Some((destination, filename)) = &snapshot.last_delivery {
                ui.label(
                    egui::RichText::new(format!("{}: {filename}", destination.label()))
                        .color(egui::Color32::from_rgb(110, 190, 110)),
                );
            }

            if let Some(notice) = &self.notice {
                ui.label(
                    egui::RichText::new(notice)
                        .color(egui::Color32::from_rgb(230, 140, 50)),
                );
            }
        });

        // Keep polling controller progress even when no input arrives.
        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}
