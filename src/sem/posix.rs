//! Raw bindings to the POSIX `sem_*` family.
//!
//! Everything here reports failures as plain `io::Error` with the errno
//! captured at the call site; the typed translation into [`LockError`]
//! happens one layer up, in `sem/mod.rs`.
//!
//! [`LockError`]: crate::error::LockError

use std::ffi::CStr;
use std::io;
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
use std::time::Duration;

#[cfg(not(any(target_os = "macos", target_os = "ios")))]
const NANOS_PER_SEC: libc::c_long = 1_000_000_000;

/// Process-local handle to a named kernel semaphore.
///
/// Valid from `open` until drop. POSIX permits any thread of the owning
/// process to operate on the handle, hence the manual `Send`/`Sync` impls.
#[derive(Debug)]
pub(crate) struct RawSem {
    sem: *mut libc::sem_t,
}

unsafe impl Send for RawSem {}
unsafe impl Sync for RawSem {}

impl RawSem {
    /// Opens the named semaphore, creating it with value `initial` if absent.
    /// An existing object is attached as-is; its value is not reset.
    pub(crate) fn open(name: &CStr, initial: u32) -> io::Result<Self> {
        // 0644 like a lock file: owner read/write, group/other read.
        let sem = unsafe {
            libc::sem_open(
                name.as_ptr(),
                libc::O_CREAT,
                0o644 as libc::c_uint,
                initial as libc::c_uint,
            )
        };
        if sem == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { sem })
    }

    /// Decrements, blocking until possible. Signal interruptions retry.
    pub(crate) fn wait(&self) -> io::Result<()> {
        loop {
            if unsafe { libc::sem_wait(self.sem) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINTR) {
                return Err(err);
            }
        }
    }

    /// Decrements without blocking. `Ok(false)` strictly means the value was 0.
    pub(crate) fn try_wait(&self) -> io::Result<bool> {
        loop {
            if unsafe { libc::sem_trywait(self.sem) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::EAGAIN) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => return Err(err),
            }
        }
    }

    /// Decrements within `timeout`. `Ok(false)` strictly means the deadline
    /// passed with the value still 0.
    #[cfg(not(any(target_os = "macos", target_os = "ios")))]
    pub(crate) fn timed_wait(&self, timeout: Duration) -> io::Result<bool> {
        let deadline = deadline_after(timeout)?;
        loop {
            if unsafe { libc::sem_timedwait(self.sem, &deadline) } == 0 {
                return Ok(true);
            }
            let err = io::Error::last_os_error();
            match err.raw_os_error() {
                Some(libc::ETIMEDOUT) => return Ok(false),
                // The deadline is absolute, so an interrupted wait resumes
                // against the same instant.
                Some(libc::EINTR) => continue,
                _ => return Err(err),
            }
        }
    }

    /// Increments, waking one waiter if any.
    pub(crate) fn post(&self) -> io::Result<()> {
        if unsafe { libc::sem_post(self.sem) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    /// Current semaphore value.
    pub(crate) fn value(&self) -> io::Result<i32> {
        let mut val: libc::c_int = 0;
        if unsafe { libc::sem_getvalue(self.sem, &mut val) } == 0 {
            Ok(val)
        } else {
            Err(io::Error::last_os_error())
        }
    }

    /// Removes the name from the system. Open handles stay usable.
    pub(crate) fn unlink(name: &CStr) -> io::Result<()> {
        if unsafe { libc::sem_unlink(name.as_ptr()) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

impl Drop for RawSem {
    fn drop(&mut self) {
        // Close failures are unreportable from a destructor; drop them.
        unsafe { libc::sem_close(self.sem) };
    }
}

/// Absolute `CLOCK_REALTIME` instant `timeout` from now, the clock
/// `sem_timedwait` measures against.
#[cfg(not(any(target_os = "macos", target_os = "ios")))]
fn deadline_after(timeout: Duration) -> io::Result<libc::timespec> {
    // Zeroed rather than a struct literal; timespec has private padding
    // fields on some targets.
    let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
    if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } != 0 {
        return Err(io::Error::last_os_error());
    }

    ts.tv_sec = ts.tv_sec.saturating_add(timeout.as_secs() as libc::time_t);
    ts.tv_nsec += timeout.subsec_nanos() as libc::c_long;
    if ts.tv_nsec >= NANOS_PER_SEC {
        ts.tv_sec = ts.tv_sec.saturating_add(1);
        ts.tv_nsec -= NANOS_PER_SEC;
    }
    Ok(ts)
}
