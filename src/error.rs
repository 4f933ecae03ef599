use core::fmt;

/// Failures reported by [`RbMultiset`](crate::RbMultiset) operations.
///
/// A call that fails leaves the tree exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// `min` or `max` was requested on a tree holding no entries.
    EmptyTree,
    /// Ordered export was asked to write into zero-capacity storage.
    ZeroCapacity,
    /// The handle was produced by a different tree.
    ForeignHandle,
    /// The node behind the handle has already been erased.
    StaleHandle,
    /// The node arena could not grow to hold a new entry.
    AllocationFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyTree => write!(f, "tree is empty"),
            Error::ZeroCapacity => write!(f, "output storage has zero capacity"),
            Error::ForeignHandle => write!(f, "handle belongs to another tree"),
            Error::StaleHandle => write!(f, "handle refers to an erased node"),
            Error::AllocationFailed => write!(f, "failed to allocate a tree node"),
        }
    }
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
