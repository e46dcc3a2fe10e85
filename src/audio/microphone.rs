//! Device acquisition seam.
//!
//! [`Microphone`] abstracts "ask the OS for the input device and start
//! feeding samples into a buffer" so the session controller can be tested
//! without audio hardware.  The production implementation is
//! [`CpalMicrophone`]; tests use `MockMicrophone`.
//!
//! `cpal::Stream` is not `Send`, so [`CpalMicrophone::acquire`] runs the
//! stream on a dedicated thread and hands back an [`ActiveCapture`] — a
//! Send-safe RAII guard.  Dropping the guard signals the thread to stop,
//! which drops the stream and releases the hardware.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::buffer::SharedSampleBuffer;
use super::capture::{AudioCapture, AudioChunk, CaptureError};
use super::downmix::downmix_to_mono;

// ---------------------------------------------------------------------------
// ActiveCapture
// ---------------------------------------------------------------------------

/// RAII guard for a running capture session.
///
/// Holds the stop channel for the capture thread; dropping this value stops
/// the hardware stream.  Unlike [`super::StreamHandle`] this type is `Send`,
/// so the controller task can own it.
pub struct ActiveCapture {
    sample_rate: u32,
    guard: Option<CaptureGuard>,
    #[cfg(test)]
    alive: Option<std::sync::Arc<std::sync::atomic::AtomicUsize>>,
}

struct CaptureGuard {
    stop_tx: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl ActiveCapture {
    fn attached(sample_rate: u32, guard: CaptureGuard) -> Self {
        Self {
            sample_rate,
            guard: Some(guard),
            #[cfg(test)]
            alive: None,
        }
    }

    /// Native sample rate the device is delivering, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl Drop for ActiveCapture {
    fn drop(&mut self) {
        if let Some(guard) = self.guard.take() {
            // Thread may already be gone (stream error path); ignore.
            let _ = guard.stop_tx.send(());
            if let Some(join) = guard.join {
                let _ = join.join();
            }
        }
        #[cfg(test)]
        if let Some(counter) = &self.alive {
            counter.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
        }
    }
}

// ---------------------------------------------------------------------------
// Microphone trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for acquiring the input device.
///
/// # Contract
///
/// - On success, mono samples flow into `buffer` until the returned
///   [`ActiveCapture`] is dropped.
/// - On failure (device absent, permission denied, stream rejected) a
///   [`CaptureError`] is returned and nothing is written to `buffer`.
/// - `acquire` may block; the controller calls it via `spawn_blocking`
///   under a timeout.
pub trait Microphone: Send + Sync {
    /// Acquire the device and start capturing into `buffer`.
    fn acquire(&self, buffer: SharedSampleBuffer) -> Result<ActiveCapture, CaptureError>;
}

// Compile-time assertion: Box<dyn Microphone> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn Microphone>) {}
};

// ---------------------------------------------------------------------------
// CpalMicrophone
// ---------------------------------------------------------------------------

/// Production [`Microphone`] backed by [`AudioCapture`].
///
/// Each `acquire` call spawns a `mic-capture` thread that owns the cpal
/// stream, downmixes every incoming chunk to mono, and appends it to the
/// shared buffer.  The thread exits when the [`ActiveCapture`] guard is
/// dropped or when the chunk channel disconnects (stream error).
pub struct CpalMicrophone;

impl Microphone for CpalMicrophone {
    fn acquire(&self, buffer: SharedSampleBuffer) -> Result<ActiveCapture, CaptureError> {
        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, CaptureError>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name("mic-capture".into())
            .spawn(move || {
                let capture = match AudioCapture::open() {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let (chunk_tx, chunk_rx) = mpsc::channel::<AudioChunk>();
                let handle = match capture.start(chunk_tx) {
                    Ok(h) => h,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let _ = ready_tx.send(Ok(capture.sample_rate()));
                log::debug!(
                    "mic-capture: streaming at {} Hz, {} ch",
                    capture.sample_rate(),
                    capture.channels()
                );

                loop {
                    if stop_rx.try_recv().is_ok() {
                        break;
                    }
                    match chunk_rx.recv_timeout(Duration::from_millis(50)) {
                        Ok(chunk) => {
                            let mono = downmix_to_mono(&chunk.samples, chunk.channels);
                            if let Ok(mut buf) = buffer.lock() {
                                buf.push_slice(&mono);
                            }
                        }
                        Err(mpsc::RecvTimeoutError::Timeout) => continue,
                        Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }

                // Dropping the handle stops the hardware stream.
                drop(handle);
                log::debug!("mic-capture: stopped");
            })
            .map_err(|e| CaptureError::Thread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(sample_rate)) => Ok(ActiveCapture::attached(
                sample_rate,
                CaptureGuard {
                    stop_tx,
                    join: Some(join),
                },
            )),
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(CaptureError::Thread(
                    "capture thread exited before reporting readiness".into(),
                ))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockMicrophone  (test-only)
// ---------------------------------------------------------------------------

/// Test double that either grants with canned silence, denies, or hangs.
#[cfg(test)]
pub struct MockMicrophone {
    behavior: MockBehavior,
    /// Number of [`ActiveCapture`] guards currently alive.
    pub alive: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
enum MockBehavior {
    /// Immediately fill the buffer with `seconds` of silence at `sample_rate`.
    Grant { seconds: f32, sample_rate: u32 },
    /// Fail with [`CaptureError::NoDevice`].
    Deny,
    /// Sleep for the given duration, then deny — exercises the acquisition
    /// timeout.
    Hang(Duration),
}

#[cfg(test)]
impl MockMicrophone {
    pub fn granting(seconds: f32, sample_rate: u32) -> Self {
        Self {
            behavior: MockBehavior::Grant {
                seconds,
                sample_rate,
            },
            alive: Default::default(),
        }
    }

    pub fn denied() -> Self {
        Self {
            behavior: MockBehavior::Deny,
            alive: Default::default(),
        }
    }

    pub fn hanging(delay: Duration) -> Self {
        Self {
            behavior: MockBehavior::Hang(delay),
            alive: Default::default(),
        }
    }

    pub fn alive_captures(&self) -> usize {
        self.alive.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Microphone for MockMicrophone {
    fn acquire(&self, buffer: SharedSampleBuffer) -> Result<ActiveCapture, CaptureError> {
        match &self.behavior {
            MockBehavior::Grant {
                seconds,
                sample_rate,
            } => {
                let n = (*seconds * *sample_rate as f32) as usize;
                buffer
                    .lock()
                    .unwrap()
                    .push_slice(&vec![0.0_f32; n]);
                self.alive
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(ActiveCapture {
                    sample_rate: *sample_rate,
                    guard: None,
                    alive: Some(std::sync::Arc::clone(&self.alive)),
                })
            }
            MockBehavior::Deny => Err(CaptureError::NoDevice),
            MockBehavior::Hang(delay) => {
                thread::sleep(*delay);
                Err(CaptureError::NoDevice)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::new_shared_buffer;

    #[test]
    fn active_capture_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<ActiveCapture>();
    }

    #[test]
    fn mock_grant_fills_buffer_with_silence() {
        let mic = MockMicrophone::granting(2.0, 44_100);
        let buffer = new_shared_buffer(44_100 * 10);

        let capture = mic.acquire(std::sync::Arc::clone(&buffer)).unwrap();
        assert_eq!(capture.sample_rate(), 44_100);
        assert_eq!(buffer.lock().unwrap().len(), 88_200);
    }

    #[test]
    fn mock_deny_leaves_buffer_untouched() {
        let mic = MockMicrophone::denied();
        let buffer = new_shared_buffer(1024);

        let result = mic.acquire(std::sync::Arc::clone(&buffer));
        assert!(matches!(result, Err(CaptureError::NoDevice)));
        assert!(buffer.lock().unwrap().is_empty());
    }

    #[test]
    fn dropping_mock_capture_decrements_alive_count() {
        let mic = MockMicrophone::granting(0.1, 8_000);
        let buffer = new_shared_buffer(8_000);

        let capture = mic.acquire(buffer).unwrap();
        assert_eq!(mic.alive_captures(), 1);
        drop(capture);
        assert_eq!(mic.alive_captures(), 0);
    }
}
