//! Linux backend built on `futex(2)`.
//!
//! Waiting and waking use the private futex operations on the address of
//! the atomic word itself, so no kernel object has to be created or freed.
//! Thread tuning uses `setpriority(2)` on the thread id and
//! `sched_setaffinity(2)` on the calling thread.

use crate::task::Priority;

use std::io;
use std::mem;
use std::ptr;
use std::sync::atomic::AtomicU32;

/// Blocks the calling thread while `word` still holds `expected`.
///
/// Returns immediately if the value already differs. Spurious returns
/// (signals, `EAGAIN`) are possible; callers re-check in a loop.
pub(crate) fn wait(word: &AtomicU32, expected: u32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
            expected,
            ptr::null::<libc::timespec>(),
        );
    }
}

/// Wakes every thread blocked in [`wait`] on `word`.
pub(crate) fn wake_all(word: &AtomicU32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            word.as_ptr(),
            libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
            i32::MAX,
        );
    }
}

/// Applies `priority` to the calling thread as a nice value.
///
/// Raising the priority above normal usually needs `CAP_SYS_NICE`;
/// the resulting `EPERM`/`EACCES` is returned to the caller.
pub(crate) fn set_current_priority(priority: Priority) -> io::Result<()> {
    let nice = match priority {
        Priority::Lowest => 19,
        Priority::BelowNormal => 10,
        Priority::Normal => 0,
        Priority::AboveNormal => -5,
        Priority::Highest => -10,
    };

    let tid = unsafe { libc::syscall(libc::SYS_gettid) } as libc::id_t;
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, tid, nice) };

    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Pins the calling thread to a single logical core.
pub(crate) fn set_current_affinity(core: usize) -> io::Result<()> {
    if core >= libc::CPU_SETSIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("core index {core} exceeds CPU_SETSIZE"),
        ));
    }

    let mut set: libc::cpu_set_t = unsafe { mem::zeroed() };
    unsafe { libc::CPU_SET(core, &mut set) };

    let rc = unsafe { libc::sched_setaffinity(0, mem::size_of::<libc::cpu_set_t>(), &set) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
