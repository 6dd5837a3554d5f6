//! Portable backend for targets without a native address wait.
//!
//! Waiters park on one of a fixed number of condition variables,
//! selected by hashing the address of the word. The table is a `static`,
//! so parking never allocates.
//!
//! A waker always changes the word *before* taking the bucket lock,
//! and a waiter re-checks the word *while* holding it; a wake-up can
//! therefore not slip between the check and the wait.

use crate::task::Priority;

use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex};

/// Number of parking buckets. Must be a power of two.
const BUCKETS: usize = 64;

struct Bucket {
    lock: Mutex<()>,
    condvar: Condvar,
}

impl Bucket {
    const fn new() -> Self {
        Self {
            lock: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }
}

static TABLE: [Bucket; BUCKETS] = [const { Bucket::new() }; BUCKETS];

fn bucket(word: &AtomicU32) -> &'static Bucket {
    let addr = word.as_ptr() as usize;
    // Words are 4-byte aligned; drop the low bits before folding.
    &TABLE[(addr >> 2) & (BUCKETS - 1)]
}

/// Blocks the calling thread while `word` still holds `expected`.
pub(crate) fn wait(word: &AtomicU32, expected: u32) {
    let bucket = bucket(word);
    let guard = bucket.lock.lock().unwrap_or_else(|e| e.into_inner());

    if word.load(Ordering::Acquire) != expected {
        return;
    }

    let _guard = bucket
        .condvar
        .wait(guard)
        .unwrap_or_else(|e| e.into_inner());
}

/// Wakes every thread blocked in [`wait`] on `word`.
///
/// Other words hashing to the same bucket see a spurious wake-up.
pub(crate) fn wake_all(word: &AtomicU32) {
    let bucket = bucket(word);
    let _guard = bucket.lock.lock().unwrap_or_else(|e| e.into_inner());
    bucket.condvar.notify_all();
}

pub(crate) fn set_current_priority(_priority: Priority) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "thread priority is not supported on this target",
    ))
}

pub(crate) fn set_current_affinity(_core: usize) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "thread affinity is not supported on this target",
    ))
}
