//! # HASP
//! Named mutual exclusion for unrelated processes.
//!
//! A hasp is the hinged fitting that lets two doors share one padlock. This
//! crate lets two (or more) processes share one lock by agreeing on nothing
//! but a string: the lock itself is a kernel-managed POSIX named semaphore,
//! used strictly as a binary lock and wrapped in an RAII handle.
//!
//! ## Core principles
//! * **One name, one lock:** every [`NamedLock`] opened with the same
//!   identifier, in any process, refers to the same kernel object.
//! * **Handles, not objects:** dropping a lock closes the process-local
//!   handle; the kernel object and its locked state outlive it. Removal is
//!   the explicit [`NamedLock::remove`], never implicit.
//! * **Two failure kinds:** every OS refusal surfaces as either an
//!   initialization error or a lock-attempt error, carrying the raw errno
//!   and the call site. "Already held" and "timed out" are ordinary results,
//!   not errors.
//!
//! The facility exists only where the OS provides named semaphores; callers
//! gate on [`HAS_PROCESS_LOCKS`] (and [`HAS_TIMED_LOCKS`] for bounded waits)
//! rather than probing at runtime.

pub mod error;
#[cfg(unix)]
pub mod sem;
#[cfg(unix)]
pub mod types;

pub use error::*;
#[cfg(unix)]
pub use sem::*;
#[cfg(unix)]
pub use types::*;

/// True when the target OS exposes named semaphores, i.e. when the lock
/// surface of this crate is compiled in at all.
pub const HAS_PROCESS_LOCKS: bool = cfg!(unix);

/// True when the target additionally supports a native bounded wait
/// (`sem_timedwait`). Where it is false, [`NamedLock::try_lock_for`] degrades
/// to the immediate [`NamedLock::try_lock`].
pub const HAS_TIMED_LOCKS: bool =
    cfg!(all(unix, not(any(target_os = "macos", target_os = "ios"))));
