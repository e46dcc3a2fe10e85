//! The persisted attempt counter.
//!
//! Countdown policy: the counter starts at the configured budget, each
//! completed stop decrements it, and it never goes below zero.  The value
//! is written through to the [`KvStore`] after every mutation, so a restart
//! resumes the correct remaining count for the current exercise.

use crate::store::{KvStore, RECORD_ATTEMPTS_KEY};

// ---------------------------------------------------------------------------
// AttemptCounter
// ---------------------------------------------------------------------------

/// Remaining recording attempts for one exercise.
///
/// Mutations persist eagerly; a failed write is reported to the caller but
/// never blocks the recording flow — the in-memory count stays correct for
/// the life of the process either way.
pub struct AttemptCounter {
    remaining: i32,
    budget: i32,
    store: KvStore,
}

impl AttemptCounter {
    /// Load the counter for the store's scope, starting from `budget` when
    /// nothing has been persisted yet.
    ///
    /// A persisted value outside `0..=budget` is clamped — the budget may
    /// have been lowered since it was written.
    pub fn load(store: KvStore, budget: i32) -> Self {
        let budget = budget.max(0);
        let remaining = store
            .get::<i32>(RECORD_ATTEMPTS_KEY)
            .unwrap_or(budget)
            .clamp(0, budget);

        Self {
            remaining,
            budget,
            store,
        }
    }

    /// Attempts left to record.
    pub fn remaining(&self) -> i32 {
        self.remaining
    }

    /// Returns `true` when no attempts are left.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Consume one attempt (floor at zero) and persist the new value.
    ///
    /// Returns the remaining count.
    pub fn record_use(&mut self) -> i32 {
        self.remaining = (self.remaining - 1).max(0);
        self.persist();
        self.remaining
    }

    /// Restore the full budget (new exercise) and persist.
    pub fn reset(&mut self) {
        self.remaining = self.budget;
        self.persist();
    }

    /// Status line for the UI, mirroring the remaining count.
    pub fn status_line(&self) -> String {
        match self.remaining {
            n if n > 1 => format!("{n} attempts left to record"),
            1 => "1 attempt left to record".into(),
            _ => "No attempts left to record".into(),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.set(RECORD_ATTEMPTS_KEY, &self.remaining) {
            log::warn!("failed to persist attempt counter: {e:#}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
