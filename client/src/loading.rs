//! Bookkeeping of outstanding network calls.
//!
//! Every call the executor issues registers here at start and completes
//! here exactly once, whatever path the call exits through. The derived
//! [`LoadingTracker::is_loading`] signal drives UI busy indicators across
//! concurrent calls, so completions may arrive in any order relative to
//! registrations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Opaque handle identifying one in-flight call.
///
/// Valid only for the tracker that issued it. Indices grow monotonically
/// while any call is outstanding and are recycled once the tracker drains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallToken(usize);

/// Shared counter of outstanding calls.
///
/// Cloning yields another handle on the same state; the executor and every
/// model hold clones of one tracker per session. Tests instantiate isolated
/// trackers instead of reaching for a global.
#[derive(Debug, Clone, Default)]
pub struct LoadingTracker {
    calls: Arc<Mutex<Vec<bool>>>,
}

impl LoadingTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new call as outstanding and return its token.
    #[must_use]
    pub fn add_call(&self) -> CallToken {
        let mut calls = self.lock();
        calls.push(true);

        CallToken(calls.len() - 1)
    }

    /// Mark a call as finished.
    ///
    /// Pure bookkeeping that cannot fail: a token that is out of range
    /// (e.g. issued before the tracker drained and reset) is a no-op, and
    /// completing the same token twice leaves other calls untouched. Once
    /// every recorded call has finished the slot list is cleared so indices
    /// stay small across a long session.
    pub fn complete_call(&self, token: CallToken) {
        let mut calls = self.lock();

        if let Some(slot) = calls.get_mut(token.0) {
            *slot = false;
        }

        if calls.iter().all(|outstanding| !outstanding) {
            calls.clear();
        }
    }

    /// True iff at least one registered call has not completed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().iter().any(|outstanding| *outstanding)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<bool>> {
        // Bookkeeping never panics while holding the lock, so a poisoned
        // mutex can only mean a panicking test thread; take the data as-is.
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// RAII registration of one call.
///
/// Registers on construction and completes on drop, guaranteeing the
/// tracker is released on every exit path of an async call, including `?`
/// propagation and transport failures.
#[derive(Debug)]
pub struct CallGuard {
    tracker: LoadingTracker,
    token: CallToken,
}

impl CallGuard {
    #[must_use]
    pub fn register(tracker: &LoadingTracker) -> Self {
        Self {
            tracker: tracker.clone(),
            token: tracker.add_call(),
        }
    }

    #[must_use]
    pub fn token(&self) -> CallToken {
        self.token
    }
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        self.tracker.complete_call(self.token);
    }
}
