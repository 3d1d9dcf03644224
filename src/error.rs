//! Error types for the spectrice crate.

use std::fmt;

/// Errors that can occur while setting up or running a freeze.
///
/// All failures are reported from initialization or from the I/O layer; the
/// per-block processing path never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FreezeError {
    /// Configuration parameter out of range or inconsistent.
    InvalidConfig(String),
    /// The session's backing allocation failed.
    OutOfMemory { requested: usize },
    /// Invalid audio container or sample format.
    InvalidFormat(String),
    /// I/O error.
    IoError(String),
    /// Input too short for the given block size.
    InputTooShort { provided: usize, minimum: usize },
}

impl fmt::Display for FreezeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FreezeError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            FreezeError::OutOfMemory { requested } => {
                write!(f, "out of memory: failed to allocate {} bytes", requested)
            }
            FreezeError::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
            FreezeError::IoError(msg) => write!(f, "I/O error: {}", msg),
            FreezeError::InputTooShort { provided, minimum } => {
                write!(
                    f,
                    "input too short: {} samples provided, {} required",
                    provided, minimum
                )
            }
        }
    }
}

impl std::error::Error for FreezeError {}

impl From<std::io::Error> for FreezeError {
    fn from(err: std::io::Error) -> Self {
        FreezeError::IoError(err.to_string())
    }
}
