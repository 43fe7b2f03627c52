//! Error types for lrucache

use std::fmt;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Requested capacity is zero, negative, or does not fit in `usize`
    InvalidCapacity,

    /// Key is absent (or its entry has expired)
    NotFound,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity => write!(f, "Invalid capacity: must be a positive integer"),
            Error::NotFound => write!(f, "Key not found"),
        }
    }
}

impl std::error::Error for Error {}
