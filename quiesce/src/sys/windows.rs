//! Windows backend built on `WaitOnAddress`.
//!
//! It mirrors the Linux backend and exposes identical function names
//! and semantics. Thread tuning uses the pseudo handle of the current
//! thread, which never has to be closed.

use crate::task::Priority;

use std::io;
use std::mem;
use std::sync::atomic::AtomicU32;

use windows_sys::Win32::System::Threading::{
    GetCurrentThread, INFINITE, SetThreadAffinityMask, SetThreadPriority,
    THREAD_PRIORITY_ABOVE_NORMAL, THREAD_PRIORITY_BELOW_NORMAL, THREAD_PRIORITY_HIGHEST,
    THREAD_PRIORITY_LOWEST, THREAD_PRIORITY_NORMAL, WaitOnAddress, WakeByAddressAll,
};

/// Blocks the calling thread while `word` still holds `expected`.
///
/// Spurious returns are possible; callers re-check in a loop.
pub(crate) fn wait(word: &AtomicU32, expected: u32) {
    unsafe {
        WaitOnAddress(
            word.as_ptr().cast(),
            (&expected as *const u32).cast(),
            mem::size_of::<u32>(),
            INFINITE,
        );
    }
}

/// Wakes every thread blocked in [`wait`] on `word`.
pub(crate) fn wake_all(word: &AtomicU32) {
    unsafe { WakeByAddressAll(word.as_ptr().cast()) };
}

/// Applies `priority` to the calling thread.
pub(crate) fn set_current_priority(priority: Priority) -> io::Result<()> {
    let level = match priority {
        Priority::Lowest => THREAD_PRIORITY_LOWEST,
        Priority::BelowNormal => THREAD_PRIORITY_BELOW_NORMAL,
        Priority::Normal => THREAD_PRIORITY_NORMAL,
        Priority::AboveNormal => THREAD_PRIORITY_ABOVE_NORMAL,
        Priority::Highest => THREAD_PRIORITY_HIGHEST,
    };

    if unsafe { SetThreadPriority(GetCurrentThread(), level) } == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Pins the calling thread to a single logical core.
pub(crate) fn set_current_affinity(core: usize) -> io::Result<()> {
    if core >= usize::BITS as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("core index {core} exceeds the affinity mask width"),
        ));
    }

    if unsafe { SetThreadAffinityMask(GetCurrentThread(), 1usize << core) } == 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
