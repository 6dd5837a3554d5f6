use super::clock::now_us;

use tracing::debug;

/// Measures a code block and logs how long it took.
///
/// The timer starts when it is created and reports when it is dropped,
/// as a `debug` event carrying the tag as a field:
///
/// ```text
/// flush | Start-Time: 0:00:01.250000 (Elapsed: 3.417 ms)
/// ```
///
/// `Start-Time` is measured from the clock origin fixed by
/// [`time::init`](super::init) (or by the first clock read if `init`
/// was never called), not from the wall clock.
///
/// Use [`profile_scope!`](crate::profile_scope) to time the rest of the
/// enclosing block.
pub struct ScopedTimer {
    tag: &'static str,
    name: &'static str,
    start_us: u64,
}

impl ScopedTimer {
    /// Starts timing `name`, reported under `tag`.
    pub fn new(tag: &'static str, name: &'static str) -> Self {
        Self {
            tag,
            name,
            start_us: now_us(),
        }
    }

    /// Microseconds elapsed since the timer was created.
    pub fn elapsed_us(&self) -> u64 {
        now_us().saturating_sub(self.start_us)
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed_us();

        debug!(
            tag = self.tag,
            "{} | Start-Time: {} (Elapsed: {})",
            self.name,
            format_time(self.start_us),
            format_duration(elapsed),
        );
    }
}

/// Renders a point in time as `h:mm:ss.uuuuuu`.
pub fn format_time(micros: u64) -> String {
    let secs = micros / 1_000_000;
    let frac = micros % 1_000_000;

    format!(
        "{}:{:02}:{:02}.{:06}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        frac
    )
}

/// Renders a duration with a unit suited to its magnitude.
pub fn format_duration(micros: u64) -> String {
    if micros < 1_000 {
        format!("{micros} µs")
    } else if micros < 1_000_000 {
        format!("{:.3} ms", micros as f64 / 1_000.0)
    } else {
        format!("{:.3} s", micros as f64 / 1_000_000.0)
    }
}

/// Times the rest of the enclosing block with a [`ScopedTimer`].
///
/// ```rust
/// fn flush() {
///     quiesce::profile_scope!("storage", "flush");
///     // ...
/// }
/// # flush();
/// ```
#[macro_export]
macro_rules! profile_scope {
    ($tag:expr, $name:expr) => {
        let _scoped_timer = $crate::time::ScopedTimer::new($tag, $name);
    };
}
