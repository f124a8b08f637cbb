//! Named cross-process locks.
//!
//! A [`NamedLock`] is a process-shared binary lock backed by a POSIX named
//! semaphore. Every instance opened with the same identifier, in this
//! process or any other, refers to the same kernel object, so the
//! locked/unlocked state is a property of that object, not of any one handle.

mod posix;

use std::time::Duration;

use crate::error::LockError;
use crate::types::LockName;

use posix::RawSem;

/// Initial value for a freshly created semaphore: one token, i.e. unlocked.
const UNLOCKED: u32 = 1;

/// Inter-process mutual exclusion handle, identified by name.
///
/// The backing primitive is a counting semaphore, but this type restricts it
/// to the values {0, 1}: one `unlock` per successful acquisition, never more.
/// Dropping the handle closes the process-local reference only; the kernel
/// object, in whatever state it is in, survives until every process has
/// closed it, or indefinitely if it was never [`removed`](NamedLock::remove).
#[derive(Debug)]
pub struct NamedLock {
    name: LockName,
    sem: RawSem,
}

impl NamedLock {
    /// Opens the lock named `identifier`, creating it unlocked if it does not
    /// exist yet. An existing object is attached without resetting its value,
    /// so a lock currently held elsewhere stays held.
    ///
    /// The kernel-visible name is the identifier with a single separator
    /// prepended; the identifier itself must satisfy [`LockName`]'s rules.
    /// Every failure (invalid identifier or a refused `sem_open`) is an
    /// [`Initialization`](crate::LockCode::Initialization) error, and no
    /// partially-opened lock is ever produced.
    pub fn open(identifier: &str) -> Result<Self, LockError> {
        let name = LockName::new(identifier)?;
        let sem = RawSem::open(name.as_c_str(), UNLOCKED)
            .map_err(|e| LockError::initialization(e))?;
        tracing::debug!("opened named semaphore {name}");
        Ok(Self { name, sem })
    }

    /// Blocks until the lock is acquired. Interrupting signals are retried
    /// internally; the call returns only once the lock is held, or fails with
    /// a [`LockAttempt`](crate::LockCode::LockAttempt) error if the wait
    /// itself is refused.
    pub fn lock(&self) -> Result<(), LockError> {
        self.sem.wait().map_err(|e| LockError::lock_attempt(e))
    }

    /// Releases the lock, waking one blocked waiter if any.
    ///
    /// The caller must unlock exactly once per successful acquisition; like
    /// any mutex, unbalanced unlocks are not defended against. A refused post
    /// has no recoverable meaning for the caller and is only logged.
    pub fn unlock(&self) {
        if let Err(e) = self.sem.post() {
            tracing::debug!("sem_post on {} failed: {e}", self.name);
        }
    }

    /// Attempts to acquire without blocking. `Ok(false)` strictly means the
    /// lock is currently held elsewhere; any other refusal is a
    /// [`LockAttempt`](crate::LockCode::LockAttempt) error.
    pub fn try_lock(&self) -> Result<bool, LockError> {
        self.sem.try_wait().map_err(|e| LockError::lock_attempt(e))
    }

    /// Attempts to acquire within `timeout`, counted from the call.
    ///
    /// `Ok(false)` means the deadline passed with the lock still held
    /// elsewhere. On targets without a native timed wait (macOS and iOS lack
    /// `sem_timedwait`, see [`crate::HAS_TIMED_LOCKS`]) this degrades to the
    /// immediate [`try_lock`](Self::try_lock); a documented weakening, not an
    /// error.
    pub fn try_lock_for(&self, timeout: Duration) -> Result<bool, LockError> {
        #[cfg(not(any(target_os = "macos", target_os = "ios")))]
        {
            self.sem
                .timed_wait(timeout)
                .map_err(|e| LockError::lock_attempt(e))
        }
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        {
            let _ = timeout;
            self.try_lock()
        }
    }

    /// Blocks until acquired and returns a guard that unlocks on drop.
    pub fn guard(&self) -> Result<LockGuard<'_>, LockError> {
        self.lock()?;
        Ok(LockGuard { lock: self })
    }

    /// Non-blocking [`guard`](Self::guard): `Ok(None)` when the lock is held
    /// elsewhere.
    pub fn try_guard(&self) -> Result<Option<LockGuard<'_>>, LockError> {
        Ok(self.try_lock()?.then(|| LockGuard { lock: self }))
    }

    /// Current semaphore value: 1 unlocked, 0 locked under this crate's
    /// usage. Diagnostic introspection only: the value is stale the moment
    /// it is read and must not drive locking decisions.
    pub fn count(&self) -> Result<i32, LockError> {
        self.sem.value().map_err(|e| LockError::lock_attempt(e))
    }

    /// The bare identifier this lock was opened with.
    pub fn identifier(&self) -> &str { self.name.identifier() }

    /// The derived kernel-visible name, separator included.
    pub fn name(&self) -> &str { self.name.as_str() }

    /// Removes `identifier`'s kernel object from the system.
    ///
    /// Handles that are still open, here or in other processes, keep
    /// working against the now-anonymous object; the name itself becomes
    /// available for a fresh, unlocked one. Dropping a [`NamedLock`] never
    /// does this: removal is always an explicit choice. Removing a name that
    /// does not exist succeeds, so restart paths can call this
    /// unconditionally.
    pub fn remove(identifier: &str) -> Result<(), LockError> {
        let name = LockName::new(identifier)?;
        match RawSem::unlink(name.as_c_str()) {
            Ok(()) => {
                tracing::debug!("unlinked named semaphore {name}");
                Ok(())
            }
            Err(e) if e.raw_os_error() == Some(libc::ENOENT) => Ok(()),
            Err(e) => Err(LockError::initialization(e)),
        }
    }
}

impl Drop for NamedLock {
    fn drop(&mut self) {
        // RawSem closes the handle; best-effort, nothing to surface.
        tracing::debug!("closing named semaphore {}", self.name);
    }
}

/// Scoped holder of a [`NamedLock`]; releases on drop.
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a NamedLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique(tag: &str) -> String {
        format!("hasp-unit-{}-{tag}", std::process::id())
    }

    #[test]
    fn test_lock_unlock_restores_count() {
        let id = unique("roundtrip");
        let lock = NamedLock::open(&id).expect("open");

        for _ in 0..5 {
            lock.lock().expect("lock");
            assert_eq!(lock.count().expect("count"), 0);
            lock.unlock();
        }
        assert_eq!(lock.count().expect("count"), 1);

        drop(lock);
        NamedLock::remove(&id).expect("remove");
    }

    #[test]
    fn test_open_attaches_without_reset() {
        let id = unique("attach");
        let first = NamedLock::open(&id).expect("open first");
        first.lock().expect("lock");

        // A second open sees the held lock, not a fresh unlocked one.
        let second = NamedLock::open(&id).expect("open second");
        assert_eq!(second.count().expect("count"), 0);

        first.unlock();
        drop((first, second));
        NamedLock::remove(&id).expect("remove");
    }

    #[test]
    fn test_guard_unlocks_on_drop() {
        let id = unique("guard");
        let lock = NamedLock::open(&id).expect("open");

        {
            let _held = lock.guard().expect("guard");
            assert_eq!(lock.count().expect("count"), 0);
            assert!(lock.try_guard().expect("try_guard").is_none());
        }
        assert_eq!(lock.count().expect("count"), 1);
        assert!(lock.try_guard().expect("try_guard").is_some());
        assert_eq!(lock.count().expect("count"), 1);

        drop(lock);
        NamedLock::remove(&id).expect("remove");
    }

    #[test]
    fn test_name_accessors() {
        let id = unique("names");
        let lock = NamedLock::open(&id).expect("open");
        assert_eq!(lock.identifier(), id);
        assert_eq!(lock.name(), format!("/{id}"));

        drop(lock);
        NamedLock::remove(&id).expect("remove");
    }

    #[test]
    fn test_remove_unknown_name_is_ok() {
        NamedLock::remove(&unique("never-created")).expect("remove of absent name");
    }
}
