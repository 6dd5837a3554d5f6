use super::builder::{TaskBuilder, Tuning};
use super::handle::{Handoff, Shared, TaskHandle};
use super::state::{CREATED, DETACHED, RUNNING, STARTING, STOP_REQUESTED, STOPPED};
use crate::error::StartError;
use crate::sync::SingleExecution;
use crate::sys;

use std::cell::UnsafeCell;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;
use tracing::{debug, trace, warn};

/// A background thread with a cooperative, race-free lifecycle.
///
/// ```text
///   Created ──start──► Starting ──handshake──► Running ──stop──► StopRequested ──► Stopped
///      ▲                  │                       │
///      └──spawn failed────┘                       └──detach──► Detached
/// ```
///
/// - [`start`](Self::start) / [`start_with`](Self::start_with) spawn the
///   thread and block until the continue handshake, so a context borrowed
///   from the caller's stack outlives every access to it.
/// - The body polls [`TaskHandle::should_quit`]; it is never terminated
///   forcibly. A body that never polls makes [`stop`](Self::stop) block
///   forever.
/// - [`stop`](Self::stop) is idempotent: concurrent callers collapse into
///   a single teardown and all return after the thread has exited.
/// - [`detach`](Self::detach) lets go of the thread without waiting.
///
/// Dropping a running task stops it.
pub struct ManagedTask {
    /// Signals shared with the spawned thread.
    shared: Arc<Shared>,

    /// Collapses concurrent `stop` calls into one teardown.
    stop_once: SingleExecution,

    /// Native thread handle.
    ///
    /// Written only by the starter while the state is `STARTING`, taken
    /// only by the single teardown (which first waits out `STARTING`) or
    /// through `&mut self`.
    thread: UnsafeCell<Option<JoinHandle<()>>>,
}

// Safety: the only non-`Sync` field is `thread`, whose accesses are
// serialized by the lifecycle state and `stop_once` as documented on it.
unsafe impl Sync for ManagedTask {}

impl ManagedTask {
    /// Creates a task object in the `Created` state.
    ///
    /// This is the only allocation of the task's lifetime.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
            stop_once: SingleExecution::new(),
            thread: UnsafeCell::new(None),
        }
    }

    /// Spawns the task's thread running `entry`.
    ///
    /// The body takes no caller context, so the handshake is completed
    /// by the spawning side right after the thread has been created.
    ///
    /// # Errors
    ///
    /// See [`StartError`]. On error the task stays in the `Created`
    /// state and the start may be retried.
    pub fn start<F>(&self, builder: &TaskBuilder, entry: F) -> Result<(), StartError>
    where
        F: FnOnce(&TaskHandle) + Send + 'static,
    {
        self.launch(builder, true, entry)
    }

    /// Spawns the task's thread and lends it `context`.
    ///
    /// Blocks until the body has consumed (or dropped) its [`Handoff`],
    /// so `context` may live on the caller's stack. `C` itself must not
    /// hold borrows, otherwise the body could carry one past the handshake. The trampoline
    /// completes the handshake itself if the body exits without doing so.
    ///
    /// # Errors
    ///
    /// See [`StartError`]. On error the task stays in the `Created`
    /// state and the start may be retried.
    pub fn start_with<C, F>(
        &self,
        builder: &TaskBuilder,
        context: &C,
        entry: F,
    ) -> Result<(), StartError>
    where
        C: Sync + 'static,
        F: for<'a> FnOnce(&TaskHandle, Handoff<'a, C>) + Send + 'static,
    {
        let context = ContextPtr((context as *const C).cast());

        self.launch(builder, false, move |handle: &TaskHandle| {
            // Safety: `launch` does not return before the handshake, and the
            // handshake completes no earlier than the drop of the `Handoff`,
            // which is the only path to the context.
            let context = unsafe { context.get::<C>() };
            entry(handle, Handoff::new(context, &handle.shared.resume));
        })
    }

    fn launch<B>(&self, builder: &TaskBuilder, resume_on_spawn: bool, body: B) -> Result<(), StartError>
    where
        B: FnOnce(&TaskHandle) + Send + 'static,
    {
        builder.validate()?;

        if self
            .shared
            .state
            .compare_exchange(CREATED, STARTING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(StartError::AlreadyStarted);
        }

        self.shared.rearm();

        let handle = TaskHandle {
            shared: self.shared.clone(),
        };
        let tuning = builder.tuning();
        let name = builder.name_or_default();

        let thread = match builder
            .thread_builder()
            .spawn(move || trampoline(handle, tuning, body))
        {
            Ok(thread) => thread,
            Err(err) => {
                warn!(task = name, error = %err, "task thread could not be created");
                self.publish(CREATED);
                return Err(StartError::Spawn(err));
            }
        };

        // Safety: this thread moved the state to STARTING; nobody else
        // touches the slot until it leaves that state.
        unsafe { *self.thread.get() = Some(thread) };

        if resume_on_spawn {
            self.shared.resume.set();
        }

        trace!(task = name, "waiting for task handshake");
        self.shared.resume.wait();

        self.publish(RUNNING);
        debug!(task = name, "task started");

        Ok(())
    }

    /// Stores a new lifecycle state and wakes threads waiting on the old one.
    fn publish(&self, state: u32) {
        self.shared.state.store(state, Ordering::Release);
        sys::wake_all(&self.shared.state);
    }

    /// Returns `true` once a stop has been requested.
    ///
    /// `true` as well for a task that was never started or has stopped.
    pub fn should_quit(&self) -> bool {
        self.shared.should_quit()
    }

    /// Returns `false` once the task's thread has signaled completion.
    ///
    /// `false` as well for a task that was never started.
    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    /// Asks the body to quit and blocks until its thread has exited.
    ///
    /// Idempotent and safe to call from several threads at once; exactly
    /// one teardown runs and every caller returns after it. Does nothing
    /// on a task that was never started.
    pub fn stop(&self) {
        let mut state = self.shared.state.load(Ordering::Acquire);
        while state == STARTING {
            sys::wait(&self.shared.state, STARTING);
            state = self.shared.state.load(Ordering::Acquire);
        }

        if state == CREATED {
            return;
        }

        self.stop_once.execute_once(|| self.teardown());
    }

    fn teardown(&self) {
        self.shared.state.store(STOP_REQUESTED, Ordering::Release);
        self.shared.must_quit.store(true, Ordering::Release);

        self.shared.stopped.wait();

        // Safety: runs once, after the state left STARTING.
        let thread = unsafe { (*self.thread.get()).take() };

        if let Some(thread) = thread {
            let name = thread.thread().name().unwrap_or("<unnamed>").to_owned();

            if thread.join().is_err() {
                warn!(task = %name, "task body panicked");
            }
            debug!(task = %name, "task stopped");
        }

        self.publish(STOPPED);
    }

    /// Lets go of the task's thread without asking it to quit and
    /// without waiting for it.
    ///
    /// Consuming the task makes a later `stop` impossible. From now on
    /// the body's [`TaskHandle`] reports `should_quit() == true` and
    /// `is_running() == false`, so a polling body winds down on its own.
    pub fn detach(mut self) {
        let thread = self.thread.get_mut().take();

        if self.shared.state.load(Ordering::Acquire) == RUNNING {
            self.shared.state.store(DETACHED, Ordering::Release);
        }

        if let Some(thread) = thread {
            debug!(
                task = thread.thread().name().unwrap_or("<unnamed>"),
                "task detached"
            );
        }
    }
}

impl Default for ManagedTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ManagedTask {
    fn drop(&mut self) {
        if self.shared.state.load(Ordering::Acquire) == RUNNING {
            self.stop();
        }
    }
}

impl std::fmt::Debug for ManagedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedTask")
            .field("should_quit", &self.should_quit())
            .field("is_running", &self.is_running())
            .finish()
    }
}

/// Type-erased pointer to the caller's context, movable into the thread.
struct ContextPtr(*const ());

// Safety: only ever turned back into `&C` with `C: Sync`.
unsafe impl Send for ContextPtr {}

impl ContextPtr {
    /// # Safety
    ///
    /// The pointer must come from a `&C` that is still borrowed for the
    /// whole of the returned lifetime.
    unsafe fn get<'a, C>(self) -> &'a C {
        unsafe { &*self.0.cast::<C>() }
    }
}

/// Entry point of every task thread.
///
/// Applies the scheduling settings, runs the body, and on every exit
/// path (including unwinding) completes the handshake and publishes
/// completion.
fn trampoline<B>(handle: TaskHandle, tuning: Tuning, body: B)
where
    B: FnOnce(&TaskHandle),
{
    let _exit = ExitSignal(&handle.shared);

    tuning.apply();
    body(&handle);
}

struct ExitSignal<'a>(&'a Shared);

impl Drop for ExitSignal<'_> {
    fn drop(&mut self) {
        self.0.resume.set();
        self.0.stopped.set();
    }
}
