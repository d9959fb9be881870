//! Error types for the DTS/DSQ codec.

use std::path::PathBuf;
use thiserror::Error;

use crate::shape::MeshKind;
use crate::tribuf::{Checkpoint, Region};

/// Main error type for DTS and DSQ operations.
///
/// Every failure is fatal for the call that produced it: there is no partial
/// shape or partially written buffer to recover.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Version outside the supported range, or a layout that is detected but not implemented
    #[error("Unsupported version {version}: {reason}")]
    UnsupportedVersion { version: i32, reason: String },

    /// A cursor would advance past the end of its region
    #[error("Truncated input in {region}: needed {needed} more, {available} available")]
    TruncatedInput {
        region: Region,
        needed: usize,
        available: usize,
    },

    /// Structural fence mismatch between writer and reader
    #[error("Guard mismatch at {checkpoint} in {region}: expected {expected}, observed {observed}")]
    GuardMismatch {
        checkpoint: Checkpoint,
        region: Region,
        expected: i32,
        observed: i32,
    },

    /// Unknown type tag or marker
    #[error("Invalid {what} tag: {value:#x}")]
    InvalidTag { what: &'static str, value: u32 },

    /// Known mesh type without a codec
    #[error("Mesh type {0:?} cannot be read or written")]
    UnsupportedMesh(MeshKind),

    /// Shape or sequence file breaks a structural invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Decoded counts or offsets make no sense
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// String cannot be represented in the file's codepage
    #[error("Invalid text: {0}")]
    InvalidText(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invariant violation error.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create an unsupported version error.
    pub fn unsupported(version: impl Into<i32>, reason: impl Into<String>) -> Self {
        Self::UnsupportedVersion {
            version: version.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::GuardMismatch {
            checkpoint: Checkpoint::Nodes,
            region: Region::Words16,
            expected: 2,
            observed: 7,
        };
        let msg = e.to_string();
        assert!(msg.contains("nodes"));
        assert!(msg.contains("16-bit"));
        assert!(msg.contains('2'));
        assert!(msg.contains('7'));

        let e = Error::unsupported(27, "vertex layout");
        assert!(e.to_string().contains("27"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
