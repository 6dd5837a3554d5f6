/// Task object exists but no thread has been spawned.
///
/// Also the state a task returns to after a failed start.
pub(crate) const CREATED: u32 = 0;

/// A thread has been requested and the starter is waiting
/// for the continue handshake.
///
/// Exactly one starter can observe this state at a time.
pub(crate) const STARTING: u32 = 1;

/// The handshake completed and the body is running.
pub(crate) const RUNNING: u32 = 2;

/// A stop has been requested; the stopper waits for the body to exit.
pub(crate) const STOP_REQUESTED: u32 = 3;

/// The thread has exited and has been joined. Terminal.
pub(crate) const STOPPED: u32 = 4;

/// The owner let go of the thread without waiting for it. Terminal.
pub(crate) const DETACHED: u32 = 5;
