use std::ffi::{CStr, CString};
use std::fmt;
use std::io;

use crate::error::LockError;

/// Portable ceiling for the derived name, separator included. POSIX allows
/// `NAME_MAX - 4` bytes for semaphore names on Linux (see sem_overview(7)).
pub const MAX_NAME_LEN: usize = 251;

/// The separator this crate injects; identifiers themselves must not contain it.
pub const NAME_SEPARATOR: char = '/';

/// A validated, kernel-visible semaphore name.
///
/// Callers supply a bare identifier; the system name is derived by prepending
/// a single [`NAME_SEPARATOR`]. The identifier must be non-empty, free of
/// separators and NUL bytes, and short enough that the derived name fits
/// [`MAX_NAME_LEN`]. Because the identifier is a mandatory constructor
/// argument, an unnamed lock cannot be expressed at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockName {
    full: String,
    c: CString,
}

impl LockName {
    pub fn new(identifier: &str) -> Result<Self, LockError> {
        if identifier.is_empty() {
            return Err(LockError::initialization(io::Error::from_raw_os_error(libc::EINVAL))
                .ctx("lock identifier must not be empty"));
        }
        if identifier.contains(NAME_SEPARATOR) {
            return Err(LockError::initialization(io::Error::from_raw_os_error(libc::EINVAL))
                .ctx(format_args!("lock identifier {identifier:?} contains a separator")));
        }
        if identifier.len() + 1 > MAX_NAME_LEN {
            return Err(
                LockError::initialization(io::Error::from_raw_os_error(libc::ENAMETOOLONG)).ctx(
                    format_args!(
                        "derived name would be {} bytes, max is {MAX_NAME_LEN}",
                        identifier.len() + 1
                    ),
                ),
            );
        }

        let full = format!("{NAME_SEPARATOR}{identifier}");
        let c = CString::new(full.clone()).map_err(|_| {
            LockError::initialization(io::Error::from_raw_os_error(libc::EINVAL))
                .ctx(format_args!("lock identifier {identifier:?} contains a NUL byte"))
        })?;

        Ok(Self { full, c })
    }

    /// The caller-supplied identifier, without the injected separator.
    pub fn identifier(&self) -> &str { &self.full[1..] }

    /// The derived kernel-visible name, separator included.
    pub fn as_str(&self) -> &str { &self.full }

    /// NUL-terminated view of the derived name, for the sem_* calls.
    pub fn as_c_str(&self) -> &CStr { &self.c }
}

impl fmt::Display for LockName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_prepends_one_separator() {
        let name = LockName::new("resource-A").expect("valid identifier");
        assert_eq!(name.as_str(), "/resource-A");
        assert_eq!(name.identifier(), "resource-A");
        assert_eq!(name.as_c_str().to_bytes(), b"/resource-A");
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let err = LockName::new("").unwrap_err();
        assert!(err.is_initialization());
        assert_eq!(err.errno(), Some(libc::EINVAL));
    }

    #[test]
    fn test_separator_in_identifier_rejected() {
        let err = LockName::new("a/b").unwrap_err();
        assert!(err.is_initialization());
        assert_eq!(err.errno(), Some(libc::EINVAL));
    }

    #[test]
    fn test_nul_in_identifier_rejected() {
        let err = LockName::new("nul\0byte").unwrap_err();
        assert!(err.is_initialization());
        assert_eq!(err.errno(), Some(libc::EINVAL));
    }

    #[test]
    fn test_over_long_identifier_rejected() {
        let long = "x".repeat(MAX_NAME_LEN);
        let err = LockName::new(&long).unwrap_err();
        assert!(err.is_initialization());
        assert_eq!(err.errno(), Some(libc::ENAMETOOLONG));

        // One byte under the ceiling still fits once the separator is added.
        let fits = "x".repeat(MAX_NAME_LEN - 1);
        assert!(LockName::new(&fits).is_ok());
    }
}
