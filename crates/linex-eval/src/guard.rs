//! Serialization of program runs.
//!
//! `save`/`load` share one filesystem namespace keyed by caller-supplied
//! names, and runs share the process for network access, so whole runs are
//! executed one at a time.

use std::sync::{Mutex, PoisonError};

/// A mutual-exclusion gate around whole program runs.
///
/// Competing callers block until the gate is free; there is no timeout and
/// no ordering between waiters.
#[derive(Debug, Default)]
pub struct RunGuard {
    lock: Mutex<()>,
}

impl RunGuard {
    pub const fn new() -> Self {
        Self {
            lock: Mutex::new(()),
        }
    }

    /// Run `f` while holding the gate.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        // The mutex guards no data, so a run that panicked leaves nothing
        // inconsistent behind
        let _held = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}

static PROCESS_GUARD: RunGuard = RunGuard::new();

/// The guard shared by every caller of [`crate::run`] in this process.
pub fn process_guard() -> &'static RunGuard {
    &PROCESS_GUARD
}
