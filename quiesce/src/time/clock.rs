use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Fixes the clock origin to "now" if it has not been fixed yet.
///
/// Call it first thing in `main` so [`now_ms`] and the start times
/// reported by [`ScopedTimer`] count from process start. Later calls
/// do nothing.
///
/// [`ScopedTimer`]: super::ScopedTimer
pub fn init() {
    EPOCH.get_or_init(Instant::now);
}

/// Returns the number of milliseconds elapsed since the process's
/// monotonic clock origin.
///
/// The origin is fixed by [`init`], or else by the first clock read
/// (the first call here or the first [`ScopedTimer`]), so values are
/// comparable across threads and never go backwards.
///
/// [`ScopedTimer`]: super::ScopedTimer
pub fn now_ms() -> u64 {
    since_epoch().as_millis() as u64
}

/// Microseconds since the clock origin.
pub(crate) fn now_us() -> u64 {
    since_epoch().as_micros() as u64
}

fn since_epoch() -> std::time::Duration {
    EPOCH.get_or_init(Instant::now).elapsed()
}
