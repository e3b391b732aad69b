//! Error types for BPS patch handling

use std::io;
use thiserror::Error;

use crate::checksum::ChecksumKind;

/// Result type alias for BPS operations
pub type Result<T> = std::result::Result<T, BpsError>;

/// Errors raised while decoding or applying a BPS patch
#[derive(Error, Debug)]
pub enum BpsError {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad magic or structurally malformed patch stream
    #[error("Invalid BPS patch at offset 0x{offset:X}: {reason}")]
    InvalidFormat {
        /// Byte offset into the patch file
        offset: u64,
        /// What was wrong
        reason: String,
    },

    /// Declared source size differs from the source supplied
    #[error("Source size mismatch: patch expects {declared} bytes, source has {actual}")]
    SizeMismatch {
        /// Size declared in the patch header
        declared: u64,
        /// Size of the source buffer
        actual: u64,
    },

    /// Variable-length integer does not fit in 64 bits
    #[error("Malformed variable-length integer at offset 0x{offset:X}")]
    MalformedInteger {
        /// Byte offset into the patch file
        offset: u64,
    },

    /// CRC-32 disagrees with the value declared in the trailer
    #[error("{kind} checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Which checksum failed
        kind: ChecksumKind,
        /// Checksum declared in the patch
        expected: u32,
        /// Checksum of the data
        actual: u32,
    },

    /// An action references bytes outside the source or target buffer
    #[error("Corrupt patch at output offset 0x{offset:X}: {reason}")]
    OutOfRange {
        /// Output position when the action was executed
        offset: u64,
        /// What was out of range
        reason: String,
    },

    /// The action stream ended before the target was filled
    #[error("Patch produced {written} of {expected} target bytes")]
    IncompleteTarget {
        /// Declared target size
        expected: u64,
        /// Bytes actually written
        written: u64,
    },
}

impl BpsError {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(offset: u64, reason: S) -> Self {
        BpsError::InvalidFormat {
            offset,
            reason: reason.into(),
        }
    }

    /// Create a new OutOfRange error
    pub fn out_of_range<S: Into<String>>(offset: usize, reason: S) -> Self {
        BpsError::OutOfRange {
            offset: offset as u64,
            reason: reason.into(),
        }
    }

    /// Check if this error must abort the operation
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BpsError::ChecksumMismatch { .. })
    }

    /// Check if this error indicates the patch is corrupted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            BpsError::InvalidFormat { .. }
                | BpsError::MalformedInteger { .. }
                | BpsError::ChecksumMismatch { .. }
                | BpsError::OutOfRange { .. }
                | BpsError::IncompleteTarget { .. }
        )
    }
}
