//! Error taxonomy for colorist-core
//!
//! Variants are grouped by the error *kind* from the design's error-handling
//! section rather than by which module raises them, so a caller can match on
//! `Error::kind()` without caring whether a bad profile came from a file or
//! from an override flag.

use thiserror::Error;

/// Result type for colorist-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error kind, used for exit-code and logging decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File missing, truncated, unrecognized magic, malformed ICC.
    Input,
    /// Depth/channel count a codec can't carry, non-gamma curve that can't
    /// be synthesised into an ICC profile, unregistered format.
    Unsupported,
    /// Bad user parameter: negative dimensions, malformed list, unknown enum.
    Validation,
    /// Non-invertible matrix, zero-luminance divide.
    Arithmetic,
    /// A collaborating codec/library failed internally.
    External,
    /// Allocation failure.
    Resource,
}

/// Errors that can occur in colorist-core operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// File missing, truncated, or otherwise unreadable.
    #[error("input error: {0}")]
    Input(String),

    /// Malformed ICC profile structure.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Unsupported ICC profile version.
    #[error("unsupported profile version: {0}")]
    UnsupportedVersion(String),

    /// A depth, channel count, or curve type the destination can't carry.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Registered-format lookup failed (unknown name or extension).
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// Bad user-supplied parameter (flag value, DSL token, rectangle, …).
    #[error("invalid parameter: {0}")]
    Validation(String),

    /// Transform construction or evaluation failed for an arithmetic reason.
    #[error("transform error: {0}")]
    Transform(String),

    /// A matrix had no inverse where one was required.
    #[error("matrix is not invertible: {0}")]
    SingularMatrix(String),

    /// Buffer size mismatch (pixel buffer vs. declared dimensions/depth).
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// A collaborating codec plugin failed; message is passed through verbatim.
    #[error("external codec error: {0}")]
    External(String),

    /// I/O error (propagated from `std::io`).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The coarse kind this error belongs to, per the design's error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Input(_) | Error::InvalidProfile(_) | Error::UnsupportedVersion(_) => {
                ErrorKind::Input
            }
            Error::Unsupported(_) | Error::UnknownFormat(_) => ErrorKind::Unsupported,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Transform(_) | Error::SingularMatrix(_) => ErrorKind::Arithmetic,
            Error::BufferSize { .. } => ErrorKind::Validation,
            Error::External(_) => ErrorKind::External,
            Error::Io(_) => ErrorKind::Resource,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_groups_match_taxonomy() {
        assert_eq!(Error::Input("x".into()).kind(), ErrorKind::Input);
        assert_eq!(Error::Unsupported("x".into()).kind(), ErrorKind::Unsupported);
        assert_eq!(Error::Validation("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(
            Error::SingularMatrix("x".into()).kind(),
            ErrorKind::Arithmetic
        );
        assert_eq!(Error::External("x".into()).kind(), ErrorKind::External);
    }
}
