//! Lock-free lifecycle primitives.
//!
//! This module provides the building blocks used to coordinate the
//! lifetime of shared resources between threads:
//! - [`SingleExecution`] runs a unit of work exactly once,
//! - [`RundownGuard`] drains concurrent users before teardown,
//! - [`Event`] is the binary signal both of them block on.
//!
//! ## Design notes
//!
//! - Each primitive's state is one atomic word, updated only through
//!   compare-and-swap or swap. No mutual-exclusion lock is taken.
//! - Nothing here allocates, so teardown paths cannot fail for lack of memory.
//! - Blocking waits park the thread through the platform layer; they do
//!   not spin and have no timeout.

mod event;
mod once;
mod rundown;

pub use event::Event;
pub use once::SingleExecution;
pub use rundown::{RundownGuard, RundownScope, RundownToken};
