//! Reconcile scheduling
//!
//! Authors type tags character by character; reconciling on every
//! keystroke would create and delete questions mid-edit (typing `[[12]]`
//! passes through `[[1]]`). The scheduler debounces: each edit resets a
//! fixed-delay window, and the reconciler runs once the window elapses.
//!
//! The scheduler deliberately never captures a snapshot. Callers re-read
//! the latest state at fire time, so two rapid edits scheduling two
//! windows cannot let a stale grow step resurrect a question a later
//! prune already removed. Correctness comes from the reconciler's
//! idempotence, not from locking.
//!
//! Time is injected as a parameter on every call, so tests drive the
//! scheduler with plain `Instant` arithmetic and need no fake clock.

use crate::config;
use std::time::{Duration, Instant};

/// Debounce window for reconcile passes.
///
/// One instance per logical writer (there is only ever one; see the
/// cooperative model in the crate docs).
#[derive(Debug, Clone)]
pub struct ReconcileScheduler {
    delay: Duration,
    deadline: Option<Instant>,
}

impl ReconcileScheduler {
    /// Scheduler with an explicit debounce delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Record a content edit at `now`, replacing any pending window.
    pub fn note_edit(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Whether a reconcile pass is scheduled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the pending window has elapsed at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Consume a due window. Returns `true` exactly once per elapsed
    /// window; the caller then reconciles its latest snapshot.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Drop any pending window without firing.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

impl Default for ReconcileScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(config::DEFAULT_DEBOUNCE_MS))
    }
}
