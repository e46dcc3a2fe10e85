//! Growable accumulation buffer for mono `f32` samples.
//!
//! Unlike a ring buffer, a [`SampleBuffer`] keeps the *head* of the
//! recording: a spoken response is read from the beginning, so when the
//! configured maximum length is reached further samples are discarded
//! rather than overwriting what was already said.
//!
//! # Example
//!
//! ```rust
//! use response_recorder::audio::SampleBuffer;
//!
//! let mut buf = SampleBuffer::new(4);
//! buf.push_slice(&[1.0, 2.0, 3.0, 4.0, 5.0]); // 5 items → cap 4 → tail dropped
//! let data = buf.drain();
//! assert_eq!(data, vec![1.0, 2.0, 3.0, 4.0]);
//! ```

// ---------------------------------------------------------------------------
// SampleBuffer
// ---------------------------------------------------------------------------

/// Accumulates mono samples for one recording session.
///
/// ## Overflow behaviour
///
/// When [`push_slice`](Self::push_slice) would exceed `max_samples`, the
/// excess is silently discarded and the buffer reports itself as
/// [`full`](Self::is_full).  The buffer never allocates beyond the cap.
pub struct SampleBuffer {
    samples: Vec<f32>,
    max_samples: usize,
}

impl SampleBuffer {
    /// Create an empty buffer capped at `max_samples`.
    ///
    /// # Panics
    ///
    /// Panics if `max_samples == 0`.
    pub fn new(max_samples: usize) -> Self {
        assert!(max_samples > 0, "SampleBuffer cap must be > 0");
        Self {
            samples: Vec::new(),
            max_samples,
        }
    }

    /// Append `data`, discarding anything past the cap.
    pub fn push_slice(&mut self, data: &[f32]) {
        let room = self.max_samples - self.samples.len();
        if room == 0 {
            return;
        }
        let take = room.min(data.len());
        self.samples.extend_from_slice(&data[..take]);
    }

    /// Take all accumulated samples, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }

    /// Discard all samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Number of samples currently stored.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` when the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples the buffer will accept.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Returns `true` when the cap has been reached and further pushes are
    /// discarded.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.max_samples
    }

    /// Current recording duration in seconds, assuming `sample_rate` Hz mono.
    pub fn duration_secs(&self, sample_rate: u32) -> f32 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// SharedSampleBuffer
// ---------------------------------------------------------------------------

/// Thread-safe handle to a [`SampleBuffer`], shared between the capture
/// thread (writer) and the session controller (reader).
///
/// Lock for a short critical section only; never hold the lock across an
/// `.await` point.
pub type SharedSampleBuffer = std::sync::Arc<std::sync::Mutex<SampleBuffer>>;

/// Construct a new [`SharedSampleBuffer`] with the given cap.
pub fn new_shared_buffer(max_samples: usize) -> SharedSampleBuffer {
    std::sync::Arc::new(std::sync::Mutex::new(SampleBuffer::new(max_samples)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
