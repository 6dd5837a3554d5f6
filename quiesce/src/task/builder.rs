use super::{Handoff, ManagedTask, Priority, TaskHandle};
use crate::error::StartError;
use crate::sys;

use std::thread;
use tracing::warn;

/// Builder for configuring and starting a [`ManagedTask`].
///
/// `TaskBuilder` collects the native thread parameters: name, stack
/// size, priority and core affinity. The same builder can start any
/// number of tasks.
///
/// # Examples
///
/// ```rust
/// use quiesce::task::{Priority, TaskBuilder};
/// use std::time::Duration;
///
/// let task = TaskBuilder::new()
///     .name("poller")
///     .stack_size(64 * 1024)
///     .priority(Priority::Normal)
///     .spawn(|handle| {
///         while !handle.should_quit() {
///             std::thread::sleep(Duration::from_millis(1));
///         }
///     })
///     .unwrap();
///
/// task.stop();
/// assert!(!task.is_running());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TaskBuilder {
    /// Thread name, visible to debuggers and in logs.
    name: Option<String>,

    /// Stack size in bytes. `None` keeps the platform default.
    stack_size: Option<usize>,

    /// Requested scheduling priority.
    priority: Option<Priority>,

    /// Logical core the thread is pinned to.
    affinity: Option<usize>,
}

impl TaskBuilder {
    /// Creates a builder with platform defaults for every parameter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the task's thread.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the stack size of the task's thread, in bytes.
    ///
    /// # Panics
    ///
    /// Panics if `size == 0`.
    pub fn stack_size(mut self, size: usize) -> Self {
        assert!(size > 0, "stack_size must be > 0");

        self.stack_size = Some(size);
        self
    }

    /// Requests a scheduling priority for the task's thread.
    ///
    /// Applied by the thread itself before the body runs. Failure to
    /// apply it (missing privileges, unsupported target) is logged and
    /// does not fail the start.
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Pins the task's thread to the logical core `core`.
    ///
    /// Best effort, like [`priority`](Self::priority).
    pub fn affinity(mut self, core: usize) -> Self {
        self.affinity = Some(core);
        self
    }

    /// Thread name used in logs; `<unnamed>` when none was configured.
    pub(crate) fn name_or_default(&self) -> &str {
        self.name.as_deref().unwrap_or("<unnamed>")
    }

    /// Starts a new task running `entry`.
    ///
    /// Shorthand for [`ManagedTask::new`] followed by [`ManagedTask::start`].
    pub fn spawn<F>(&self, entry: F) -> Result<ManagedTask, StartError>
    where
        F: FnOnce(&TaskHandle) + Send + 'static,
    {
        let task = ManagedTask::new();
        task.start(self, entry)?;
        Ok(task)
    }

    /// Starts a new task that receives a borrowed `context`.
    ///
    /// Shorthand for [`ManagedTask::new`] followed by [`ManagedTask::start_with`].
    pub fn spawn_with<C, F>(&self, context: &C, entry: F) -> Result<ManagedTask, StartError>
    where
        C: Sync + 'static,
        F: for<'a> FnOnce(&TaskHandle, Handoff<'a, C>) + Send + 'static,
    {
        let task = ManagedTask::new();
        task.start_with(self, context, entry)?;
        Ok(task)
    }

    /// Rejects parameters the OS would refuse.
    pub(crate) fn validate(&self) -> Result<(), StartError> {
        match &self.name {
            Some(name) if name.contains('\0') => Err(StartError::InvalidName { name: name.clone() }),
            _ => Ok(()),
        }
    }

    /// Builds the std thread builder for name and stack size.
    pub(crate) fn thread_builder(&self) -> thread::Builder {
        let mut builder = thread::Builder::new();

        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        builder
    }

    /// Extracts the settings the new thread applies to itself.
    pub(crate) fn tuning(&self) -> Tuning {
        Tuning {
            priority: self.priority,
            affinity: self.affinity,
        }
    }
}

/// Scheduling settings applied from inside the spawned thread.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tuning {
    priority: Option<Priority>,
    affinity: Option<usize>,
}

impl Tuning {
    /// Applies the settings to the calling thread, logging failures.
    pub(crate) fn apply(self) {
        if let Some(priority) = self.priority {
            if let Err(err) = sys::set_current_priority(priority) {
                warn!(?priority, error = %err, "could not apply task priority");
            }
        }

        if let Some(index) = self.affinity {
            if let Err(err) = sys::set_current_affinity(index) {
                warn!(core = index, error = %err, "could not pin task to core");
            }
        }
    }
}
