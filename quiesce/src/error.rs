//! Error types returned by the task lifecycle.
//!
//! The synchronization primitives never fail: saturation is reported as
//! a refused acquisition and misuse panics. Only starting a task can run
//! out of resources, and that is reported through [`StartError`].

use std::io;
use thiserror::Error;

/// # Errors produced when starting a task.
///
/// A failed start leaves the task in its created state, so the caller
/// may retry, degrade or give up. Nothing is retried automatically.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartError {
    /// The task has already been started (or stopped, or detached).
    #[error("task has already been started")]
    AlreadyStarted,

    /// The configured thread name cannot be handed to the OS.
    #[error("invalid task name {name:?}: names may not contain NUL bytes")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// The operating system refused to create the thread.
    #[error("failed to spawn task thread: {0}")]
    Spawn(#[source] io::Error),
}

impl StartError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use quiesce::StartError;
    ///
    /// assert_eq!(StartError::AlreadyStarted.as_label(), "start_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::AlreadyStarted => "start_already_started",
            StartError::InvalidName { .. } => "start_invalid_name",
            StartError::Spawn(_) => "start_spawn_failed",
        }
    }

    /// Returns `true` if retrying the same start may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StartError::Spawn(_))
    }
}
