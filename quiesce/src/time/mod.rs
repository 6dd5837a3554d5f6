//! Time utilities.
//!
//! This module provides:
//! - [`now_ms`], a monotonic millisecond clock whose origin is fixed by [`init`],
//! - [`ScopedTimer`] and [`profile_scope!`](crate::profile_scope) for
//!   logging how long a block took.

mod clock;
mod profiler;

#[doc(inline)]
pub use clock::{init, now_ms};

#[doc(inline)]
pub use profiler::{ScopedTimer, format_duration, format_time};
