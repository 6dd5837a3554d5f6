//! Managed background tasks.
//!
//! A [`ManagedTask`] owns one native thread and drives it through a
//! three-phase lifecycle:
//! - a start handshake, so the new thread can copy caller-owned
//!   parameters before the caller moves on,
//! - a cooperative run, during which the body polls
//!   [`TaskHandle::should_quit`],
//! - a stop (ask, then wait for exit) or a detach (let go without waiting).
//!
//! Thread parameters are configured through [`TaskBuilder`].

mod builder;
mod core;
mod handle;
mod priority;
mod state;

pub use builder::TaskBuilder;
pub use self::core::ManagedTask;
pub use handle::{Handoff, TaskHandle};
pub use priority::Priority;
