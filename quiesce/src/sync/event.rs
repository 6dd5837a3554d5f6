use crate::sys;

use std::sync::atomic::{AtomicU32, Ordering};

const CLEAR: u32 = 0;
const SET: u32 = 1;

/// A binary event that threads can block on until it is set.
///
/// An `Event` starts clear. [`set`](Self::set) publishes everything the
/// setter did before it (release ordering) and wakes every thread parked
/// in [`wait`](Self::wait). Setting an already set event is harmless.
///
/// The event stays set until [`reset`](Self::reset) starts a new cycle.
/// It is a single word and needs no teardown.
pub struct Event {
    state: AtomicU32,
}

impl Event {
    /// Creates a clear event.
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(CLEAR),
        }
    }

    /// Sets the event and wakes all waiters.
    pub fn set(&self) {
        if self.state.swap(SET, Ordering::Release) == CLEAR {
            sys::wake_all(&self.state);
        }
    }

    /// Returns `true` if the event is set. Never blocks.
    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) == SET
    }

    /// Blocks the calling thread until the event is set.
    ///
    /// There is no timeout: the wait is bounded only by some other
    /// thread eventually calling [`set`](Self::set).
    pub fn wait(&self) {
        while self.state.load(Ordering::Acquire) == CLEAR {
            sys::wait(&self.state, CLEAR);
        }
    }

    /// Clears the event for a new cycle.
    ///
    /// Only meaningful when no thread is currently waiting; callers
    /// guarantee that through their own state machine.
    pub(crate) fn reset(&self) {
        self.state.store(CLEAR, Ordering::Relaxed);
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Event")
            .field("set", &self.is_set())
            .finish()
    }
}
