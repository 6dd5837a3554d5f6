use super::Event;

use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, trace};

/// Sticky bit set once a drain has begun.
const DRAINING: u32 = 0x8000_0000;

/// Mask of the active-reference count. Its value is also the largest
/// count the word can represent; acquisitions beyond it are refused.
const REF_MASK: u32 = !DRAINING;

/// Protects a resource from being torn down while it is still in use.
///
/// Users bracket each use with [`acquire`](Self::acquire) and
/// [`release`](Self::release) (or the scoped [`enter`](Self::enter)).
/// The thread that tears the resource down calls [`wait`](Self::wait):
/// it refuses every new acquisition, then blocks until the last
/// outstanding use has been released.
///
/// The draining flag and the reference count share one atomic word, so
/// "is a drain in progress?" and "take a reference" are decided by the
/// same compare-and-swap. Acquire and release never take a lock.
///
/// ```text
///   Open ──wait()──► Draining ──(count reaches 0)──► drained
///   acquire: ok      acquire: refused
/// ```
///
/// # Examples
///
/// ```rust
/// use quiesce::sync::RundownGuard;
///
/// let guard = RundownGuard::new();
///
/// {
///     let scope = guard.enter();
///     assert!(scope.acquired());
///     // use the protected resource
/// }
///
/// guard.wait();
/// assert!(guard.acquire().is_none());
/// ```
pub struct RundownGuard {
    /// Draining bit plus active-reference count.
    counter: AtomicU32,

    /// Set when the count reaches zero while draining.
    drained: Event,
}

/// Proof of a successful [`RundownGuard::acquire`].
///
/// Hand it back to [`RundownGuard::release`] exactly once. Dropping a
/// token without releasing it leaks the reference, and a later
/// [`RundownGuard::wait`] will never return.
#[must_use = "a rundown token must be handed back to `RundownGuard::release`"]
#[derive(Debug)]
pub struct RundownToken {
    _private: (),
}

impl RundownGuard {
    /// Creates an open guard with no outstanding references.
    pub const fn new() -> Self {
        Self {
            counter: AtomicU32::new(0),
            drained: Event::new(),
        }
    }

    /// Attempts to take a reference on the protected resource.
    ///
    /// Returns `None` without side effects once a drain has begun, or
    /// when the count is saturated. Saturation is transient; the caller
    /// may retry after other users release.
    pub fn acquire(&self) -> Option<RundownToken> {
        let mut current = self.counter.load(Ordering::Acquire);

        loop {
            if current & DRAINING != 0 {
                trace!("rundown acquire refused: draining");
                return None;
            }
            if current & REF_MASK == REF_MASK {
                trace!("rundown acquire refused: counter saturated");
                return None;
            }

            match self.counter.compare_exchange_weak(
                current,
                current + 1,
                Ordering::Acquire,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(RundownToken { _private: () }),
                Err(actual) => current = actual,
            }
        }
    }

    /// Gives back a reference taken by [`acquire`](Self::acquire).
    ///
    /// If this was the last reference and a drain is in progress, the
    /// draining thread is woken.
    ///
    /// # Panics
    ///
    /// Panics if no reference is outstanding. The counter is left
    /// untouched so other users are not corrupted.
    pub fn release(&self, token: RundownToken) {
        let RundownToken { _private: () } = token;
        let mut current = self.counter.load(Ordering::Acquire);

        loop {
            let refs = current & REF_MASK;
            assert!(refs != 0, "RundownGuard::release called without a matching acquire");

            let next = (current & DRAINING) | (refs - 1);

            match self.counter.compare_exchange_weak(
                current,
                next,
                Ordering::Release,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if next == DRAINING {
                        debug!("rundown: last reference released");
                        self.drained.set();
                    }
                    return;
                }
                Err(actual) => current = actual,
            }
        }
    }

    /// Takes a scoped reference that is released when the scope drops.
    ///
    /// Check [`RundownScope::acquired`] before touching the resource.
    pub fn enter(&self) -> RundownScope<'_> {
        RundownScope {
            guard: self,
            token: self.acquire(),
        }
    }

    /// Begins the drain and blocks until every reference is released.
    ///
    /// After the first call, every [`acquire`](Self::acquire) fails.
    /// Concurrent and repeated calls are allowed; they all return once
    /// the drain is complete.
    pub fn wait(&self) {
        let mut current = self.counter.load(Ordering::Acquire);

        while current & DRAINING == 0 {
            match self.counter.compare_exchange_weak(
                current,
                current | DRAINING,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    debug!(active = current, "rundown: drain started");
                    // No release will ever observe the zero count for us.
                    if current == 0 {
                        self.drained.set();
                    }
                    break;
                }
                Err(actual) => current = actual,
            }
        }

        // Setting the event follows the last release on the same thread,
        // so waking from it also observes every released critical section.
        self.drained.wait();
    }

    /// Returns `true` once [`wait`](Self::wait) has been called.
    pub fn is_draining(&self) -> bool {
        self.counter.load(Ordering::Acquire) & DRAINING != 0
    }

    /// Number of references currently outstanding.
    pub fn active(&self) -> u32 {
        self.counter.load(Ordering::Acquire) & REF_MASK
    }

    /// Returns the guard to the open state so it can protect a new
    /// resource lifetime.
    ///
    /// # Panics
    ///
    /// Panics if references are still outstanding.
    pub fn reset(&mut self) {
        let refs = *self.counter.get_mut() & REF_MASK;
        assert!(refs == 0, "RundownGuard::reset with {refs} outstanding references");

        *self.counter.get_mut() = 0;
        self.drained.reset();
    }
}

impl Default for RundownGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RundownGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RundownGuard")
            .field("draining", &self.is_draining())
            .field("active", &self.active())
            .finish()
    }
}

/// Scoped reference on a [`RundownGuard`].
///
/// Created by [`RundownGuard::enter`]. Releases the reference on drop,
/// but only if the acquisition succeeded.
#[must_use = "the reference is released as soon as the scope is dropped"]
pub struct RundownScope<'a> {
    guard: &'a RundownGuard,
    token: Option<RundownToken>,
}

impl RundownScope<'_> {
    /// Returns `true` if the reference was taken and the resource may be used.
    pub fn acquired(&self) -> bool {
        self.token.is_some()
    }
}

impl Drop for RundownScope<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.guard.release(token);
        }
    }
}
