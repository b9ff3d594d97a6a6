//! Endpoint addressing for the local-domain (`AF_UNIX`) transport.

use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The usable length of a `sockaddr_un.sun_path` on Linux, minus the
/// terminating NUL the kernel appends.
pub const MAX_PATH_LEN: usize = 107;

/// A UTF-8 file-system path naming a local-domain stream socket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpcAddress(PathBuf);

impl IpcAddress {
    /// Validate and wrap a path.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, AddressError> {
        let path = path.into();
        let len = path.as_os_str().len();
        if len == 0 {
            return Err(AddressError::Empty);
        }
        if len > MAX_PATH_LEN {
            return Err(AddressError::TooLong(len));
        }
        if path.as_os_str().as_bytes().contains(&0) {
            return Err(AddressError::InteriorNul);
        }
        Ok(Self(path))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl FromStr for IpcAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("ipc://").unwrap_or(s);
        Self::new(s)
    }
}

impl fmt::Display for IpcAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ipc://{}", self.0.display())
    }
}

/// Errors constructing or validating an [`IpcAddress`].
#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("endpoint address must not be empty")]
    Empty,

    #[error("endpoint address is {0} bytes, exceeds the {MAX_PATH_LEN}-byte sockaddr_un limit")]
    TooLong(usize),

    #[error("endpoint address contains an interior NUL byte")]
    InteriorNul,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
