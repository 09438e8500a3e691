//! Error types for the Meridian3D spatial core.
//!
//! All tree-structural errors propagate to the immediate caller; nothing
//! is retried internally. The partitioner layer decides which conditions
//! are fatal and which are absorbed (log-and-continue).

use std::fmt;

/// Result type for Meridian3D operations
pub type Result<T> = std::result::Result<T, Error>;

/// Meridian3D spatial core errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An internal tree invariant is broken (e.g. direct access to a child
    /// node that does not exist). Indicates a programmer error, never a
    /// recoverable runtime state.
    StructuralViolation(String),

    /// The object is not tracked by the tree (shrink/find/relocate on an
    /// object that was never grown, or already shrunk).
    NotFound,

    /// The object is already tracked; growing it a second time is rejected.
    AlreadyTracked,

    /// The tree has no root yet (no object was ever inserted).
    UninitializedTree,

    /// Invalid construction parameter (e.g. non-positive node width).
    InvalidConfiguration(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::StructuralViolation(msg) => write!(f, "Structural violation: {}", msg),
            Error::NotFound => write!(f, "Object is not tracked by the octree"),
            Error::AlreadyTracked => write!(f, "Object is already tracked by the octree"),
            Error::UninitializedTree => write!(f, "Octree has not been initialized"),
            Error::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
