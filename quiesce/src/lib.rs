//! # Quiesce
//!
//! **Quiesce** provides lifecycle primitives for resources that are used
//! concurrently and for the background threads that use them, in
//! environments where teardown must neither fail nor allocate.
//!
//! Three tightly coupled pieces cover the "safe teardown under concurrent
//! use" problem:
//!
//! - [`SingleExecution`](sync::SingleExecution) runs a unit of work exactly
//!   once across any number of concurrent callers,
//! - [`RundownGuard`](sync::RundownGuard) lets many users hold a resource
//!   while one teardown initiator waits for all of them to leave,
//! - [`ManagedTask`](task::ManagedTask) runs a native thread with a start
//!   handshake, cooperative cancellation and an idempotent stop.
//!
//! The synchronization state is always a single atomic word updated by
//! compare-and-swap; blocking waits park the thread through the OS
//! (`futex` on Linux, `WaitOnAddress` on Windows).
//!
//! ## Quick Start
//!
//! ```rust
//! use quiesce::sync::RundownGuard;
//! use quiesce::task::TaskBuilder;
//! use std::sync::Arc;
//!
//! let guard = Arc::new(RundownGuard::new());
//! let worker_guard = guard.clone();
//!
//! let task = TaskBuilder::new()
//!     .name("worker")
//!     .spawn(move |handle| {
//!         while !handle.should_quit() {
//!             let scope = worker_guard.enter();
//!             if !scope.acquired() {
//!                 break;
//!             }
//!             // use the protected resource
//!         }
//!     })
//!     .unwrap();
//!
//! guard.wait(); // no new users; wait for the current one
//! task.stop();
//! ```
//!
//! ## Modules
//!
//! - [`sync`] — Single execution, rundown protection and events
//! - [`task`] — Managed background threads
//! - [`time`] — Monotonic clock and scoped timers
//!
//! ## Logging
//!
//! Lifecycle transitions are reported through [`tracing`] at `debug`
//! level, best-effort failures at `warn`. Install any subscriber to see them.

mod error;
mod sys;

pub mod sync;
pub mod task;
pub mod time;

pub use error::StartError;
