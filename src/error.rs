use std::panic::Location;
use std::{fmt, io};

use liaise::{Liaise, RegisterErrors};

#[derive(RegisterErrors, Debug, Copy, Clone)]
#[error_prefix("HASP")] // Sets the reporting prefix
pub enum LockCode {
    Initialization = 1,
    LockAttempt = 2,
}

impl Liaise for LockCode {
    fn code_id(&self) -> u16 { *self as u16 }

    fn message(&self) -> String {
        match self {
            Self::Initialization => "Semaphore initialization failed".to_string(),
            Self::LockAttempt => "Lock attempt failed".to_string(),
        }
    }
}

/// Concrete runtime error type for the crate.
/// Uses `liaise` for stable IDs + formatting; no `thiserror`.
///
/// Exactly two kinds exist: [`LockCode::Initialization`] for open/validate/
/// remove failures and [`LockCode::LockAttempt`] for everything a wait call
/// can report that is not "already held" or "timed out" (those two are
/// ordinary boolean results, never errors). Each error keeps the originating
/// OS error (so the raw errno survives) and the library call site that
/// raised it.
#[derive(Debug)]
pub struct LockError {
    pub code: LockCode,
    pub ctx: Option<String>,

    /// Library call site that raised the error, captured via `#[track_caller]`.
    pub at: &'static Location<'static>,

    /// The originating OS error, when an OS call is what failed.
    pub source: Option<io::Error>,
}

impl LockError {
    #[inline]
    #[track_caller]
    pub fn new(code: LockCode) -> Self {
        Self { code, ctx: None, at: Location::caller(), source: None }
    }

    #[inline]
    pub fn ctx(mut self, ctx: impl fmt::Display) -> Self {
        self.ctx = Some(ctx.to_string());
        self
    }

    #[inline]
    #[track_caller]
    pub fn initialization(err: io::Error) -> Self {
        Self {
            code: LockCode::Initialization,
            ctx: Some(err.to_string()),
            at: Location::caller(),
            source: Some(err),
        }
    }

    #[inline]
    #[track_caller]
    pub fn lock_attempt(err: io::Error) -> Self {
        Self {
            code: LockCode::LockAttempt,
            ctx: Some(err.to_string()),
            at: Location::caller(),
            source: Some(err),
        }
    }

    /// Raw OS error number from the originating call, when there was one.
    #[inline]
    pub fn errno(&self) -> Option<i32> {
        self.source.as_ref().and_then(io::Error::raw_os_error)
    }

    #[inline]
    pub fn is_initialization(&self) -> bool {
        matches!(self.code, LockCode::Initialization)
    }

    #[inline]
    pub fn is_lock_attempt(&self) -> bool {
        matches!(self.code, LockCode::LockAttempt)
    }
}

impl fmt::Display for LockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical format: "[HASP0001] msg: ctx (errno 13, src/sem/mod.rs:62:14)"
        let base = self.code.render();
        match &self.ctx {
            Some(ctx) => write!(f, "{base}: {ctx}")?,
            None => write!(f, "{base}")?,
        }
        match self.errno() {
            Some(n) => write!(f, " (errno {n}, {})", self.at),
            None => write!(f, " ({})", self.at),
        }
    }
}

impl std::error::Error for LockError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(e) => Some(e),
            None => None,
        }
    }
}

impl From<io::Error> for LockError {
    #[inline]
    fn from(e: io::Error) -> Self {
        LockError::lock_attempt(e)
    }
}
