//! Platform-specific blocking and thread-tuning primitives.
//!
//! Everything above this module is lock-free and only needs two things
//! from the operating system:
//! - a way to park the calling thread until a 32-bit atomic word changes,
//! - a way to tune the scheduling of the current thread (priority, core).
//!
//! The concrete implementation is selected at compile time
//! depending on the target operating system. Targets without a native
//! address-wait facility use a fixed table of condition variables.

#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) mod linux;

#[cfg(windows)]
pub(crate) mod windows;

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
pub(crate) mod fallback;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub(crate) use linux as platform;

#[cfg(windows)]
pub(crate) use windows as platform;

#[cfg(not(any(target_os = "linux", target_os = "android", windows)))]
pub(crate) use fallback as platform;

pub(crate) use platform::{set_current_affinity, set_current_priority, wait, wake_all};
