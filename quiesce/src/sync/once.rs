use crate::sys;

use std::sync::atomic::{AtomicU32, Ordering};

/// No caller has claimed the action yet.
const NOT_STARTED: u32 = 0;

/// One caller is executing the action; everyone else waits.
const RUNNING: u32 = 1;

/// The action has completed. Terminal until [`SingleExecution::reset`].
const FINISHED: u32 = 2;

/// Runs a unit of work exactly once, no matter how many threads ask.
///
/// The first caller of [`execute_once`](Self::execute_once) runs the
/// action on its own thread. Callers that arrive while it is running
/// park until it finishes; callers that arrive afterwards return at once.
/// Every caller returns only after the action's effects are visible.
///
/// The guard is a single atomic word: it never allocates and it never
/// blocks the thread that runs the action. Because [`new`](Self::new) is
/// `const`, a guard can live in a `static` to replace a process-wide
/// "already initialized" flag.
///
/// # Examples
///
/// ```rust
/// use quiesce::sync::SingleExecution;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// static INIT: SingleExecution = SingleExecution::new();
/// static CALLS: AtomicUsize = AtomicUsize::new(0);
///
/// for _ in 0..3 {
///     INIT.execute_once(|| {
///         CALLS.fetch_add(1, Ordering::Relaxed);
///     });
/// }
///
/// assert_eq!(CALLS.load(Ordering::Relaxed), 1);
/// ```
pub struct SingleExecution {
    state: AtomicU32,
}

impl SingleExecution {
    /// Creates a guard whose action has not run yet.
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(NOT_STARTED),
        }
    }

    /// Re-arms the guard so the next [`execute_once`](Self::execute_once)
    /// runs its action again.
    ///
    /// Requires exclusive access, so no caller can be inside the guard.
    pub fn reset(&mut self) {
        *self.state.get_mut() = NOT_STARTED;
    }

    /// Returns `true` once the action has completed. Never blocks.
    pub fn is_finished(&self) -> bool {
        self.state.load(Ordering::Acquire) == FINISHED
    }

    /// Runs `action` if no caller has run it yet, otherwise waits for
    /// the caller that did.
    ///
    /// The action has no failure channel; report outcomes through the
    /// state it captures. If it panics, the guard is still marked
    /// finished and waiters are released: the single execution happened.
    pub fn execute_once<F>(&self, action: F)
    where
        F: FnOnce(),
    {
        match self.state.compare_exchange(
            NOT_STARTED,
            RUNNING,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                let _finish = Finish(&self.state);
                action();
            }
            Err(RUNNING) => self.wait_finished(),
            Err(_) => {}
        }
    }

    fn wait_finished(&self) {
        loop {
            let state = self.state.load(Ordering::Acquire);
            if state != RUNNING {
                return;
            }
            sys::wait(&self.state, RUNNING);
        }
    }
}

impl Default for SingleExecution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SingleExecution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state.load(Ordering::Acquire) {
            NOT_STARTED => "not_started",
            RUNNING => "running",
            _ => "finished",
        };
        f.debug_struct("SingleExecution")
            .field("state", &state)
            .finish()
    }
}

/// Publishes completion when the winning caller leaves, even by unwinding.
struct Finish<'a>(&'a AtomicU32);

impl Drop for Finish<'_> {
    fn drop(&mut self) {
        self.0.store(FINISHED, Ordering::Release);
        sys::wake_all(self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_rearms_the_action() {
        let mut once = SingleExecution::new();
        let mut runs = 0;

        once.execute_once(|| runs += 1);
        assert!(once.is_finished());

        once.reset();
        assert!(!once.is_finished());

        once.execute_once(|| runs += 1);
        assert_eq!(runs, 2);
    }

    #[test]
    fn panicking_action_still_finishes() {
        let once = SingleExecution::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            once.execute_once(|| panic!("boom"));
        }));

        assert!(result.is_err());
        assert!(once.is_finished());

        let mut ran = false;
        once.execute_once(|| ran = true);
        assert!(!ran);
    }
}
