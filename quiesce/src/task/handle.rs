use super::state::{CREATED, RUNNING, STARTING, STOP_REQUESTED};
use crate::sync::Event;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tracing::trace;

/// Signals shared between a [`ManagedTask`](super::ManagedTask) and its thread.
///
/// Allocated once when the task object is created; a start only clears it.
pub(crate) struct Shared {
    /// Lifecycle state (see `task::state`).
    pub(crate) state: AtomicU32,

    /// Set by `stop`; polled by the body through `should_quit`.
    pub(crate) must_quit: AtomicBool,

    /// Start handshake: the new thread no longer needs the caller's context.
    pub(crate) resume: Event,

    /// Set by the trampoline right before the thread exits.
    pub(crate) stopped: Event,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU32::new(CREATED),
            must_quit: AtomicBool::new(false),
            resume: Event::new(),
            stopped: Event::new(),
        }
    }

    /// Clears every signal for a new start.
    ///
    /// Only called by the starter that moved the state to `STARTING`.
    pub(crate) fn rearm(&self) {
        self.must_quit.store(false, Ordering::Relaxed);
        self.resume.reset();
        self.stopped.reset();
    }

    fn is_live(&self) -> bool {
        matches!(
            self.state.load(Ordering::Acquire),
            STARTING | RUNNING | STOP_REQUESTED
        )
    }

    pub(crate) fn should_quit(&self) -> bool {
        !self.is_live() || self.must_quit.load(Ordering::Acquire)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.is_live() && !self.stopped.is_set()
    }
}

/// The task body's view of its own lifecycle.
///
/// Passed by reference to the entry function. The body polls
/// [`should_quit`](Self::should_quit) from its own loop and returns
/// when it turns `true`; nothing ever terminates it forcibly.
#[derive(Clone)]
pub struct TaskHandle {
    pub(crate) shared: Arc<Shared>,
}

impl TaskHandle {
    /// Returns `true` once the task has been asked to exit.
    ///
    /// Also `true` after the owner detached the task. Never blocks and
    /// has no side effects, so it can be polled at any frequency.
    pub fn should_quit(&self) -> bool {
        self.shared.should_quit()
    }

    /// Returns `false` once the task has signaled completion or was detached.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("should_quit", &self.should_quit())
            .field("is_running", &self.is_running())
            .finish()
    }
}

/// Caller-owned context lent to a task body during the start handshake.
///
/// The starter stays blocked inside
/// [`ManagedTask::start_with`](super::ManagedTask::start_with) until the
/// handoff is consumed or dropped, so the borrowed context (often a value
/// on the starter's stack) is valid for as long as a `Handoff` exists.
/// Copy what the body needs out of it, then let it go:
///
/// ```rust
/// use quiesce::task::TaskBuilder;
///
/// let port = 8080u16;
/// let task = TaskBuilder::new()
///     .spawn_with(&port, |handle, handoff| {
///         let port = handoff.cloned();
///         while !handle.should_quit() {
///             std::thread::yield_now();
///         }
///         assert_eq!(port, 8080);
///     })
///     .unwrap();
///
/// task.stop();
/// ```
///
/// The context type itself cannot carry a borrow, so nothing taken out
/// of the handoff can point into the starter's stack:
///
/// ```rust,compile_fail
/// use quiesce::task::TaskBuilder;
///
/// let owned = String::from("config");
/// let borrowed = &owned;
///
/// let task = TaskBuilder::new()
///     .spawn_with(&borrowed, |_handle, handoff| {
///         let escaped: &String = handoff.cloned();
///         std::thread::sleep(std::time::Duration::from_millis(50));
///         assert_eq!(escaped, "config");
///     })
///     .unwrap();
///
/// drop(owned);
/// task.stop();
/// ```
pub struct Handoff<'a, C> {
    context: &'a C,
    resume: &'a Event,
}

impl<'a, C> Handoff<'a, C> {
    pub(crate) fn new(context: &'a C, resume: &'a Event) -> Self {
        Self { context, resume }
    }

    /// Reads the context through `f`, then releases the starter.
    ///
    /// The reference passed to `f` cannot outlive the call.
    pub fn receive<R>(self, f: impl FnOnce(&C) -> R) -> R {
        f(self.context)
    }

    /// Clones the context, then releases the starter.
    pub fn cloned(self) -> C
    where
        C: Clone + Send,
    {
        self.receive(C::clone)
    }
}

impl<C> Drop for Handoff<'_, C> {
    fn drop(&mut self) {
        trace!("task handoff complete");
        self.resume.set();
    }
}
