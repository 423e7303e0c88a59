use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// Counts in-flight build operations and lets callers block until all of
/// them have finished.
///
/// A build counts as finished only once its guard drops, and the builder is
/// expected to hold the guard until its last fill command is enqueued, so a
/// caller returning from [`wait_idle`](GenerationTracker::wait_idle) knows
/// the queue already holds everything the builds produced.
pub struct GenerationTracker {
    count: Mutex<usize>,
    idle: Condvar,
}

impl GenerationTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(GenerationTracker {
            count: Mutex::new(0),
            idle: Condvar::new(),
        })
    }

    /// Register a build. The returned guard ends the build when dropped.
    pub fn begin(self: &Arc<Self>) -> BuildGuard {
        *self.count.lock() += 1;
        BuildGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Block until no builds are in flight.
    pub fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count != 0 {
            self.idle.wait(&mut count);
        }
    }

    /// Builds currently in flight; for status reporting only.
    pub fn in_flight(&self) -> usize {
        *self.count.lock()
    }
}

/// RAII handle for one in-flight build.
pub struct BuildGuard {
    tracker: Arc<GenerationTracker>,
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        let mut count = self.tracker.count.lock();
        *count -= 1;
        if *count == 0 {
            self.tracker.idle.notify_all();
        }
    }
}
