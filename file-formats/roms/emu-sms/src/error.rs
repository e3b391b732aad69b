//! Error handling for ROM inspection

use std::io;
use thiserror::Error;

/// Errors that can occur when inspecting a ROM image
#[derive(Debug, Error)]
pub enum SmsError {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The image exceeds the supported ROM size
    #[error("ROM size {size} bytes exceeds the permitted maximum of {max} bytes")]
    RomTooLarge {
        /// Size of the image
        size: u64,
        /// Largest accepted size
        max: u64,
    },

    /// The image is too short to contain the header block
    #[error("ROM too small: {size} bytes, header block needs {needed}")]
    RomTooSmall {
        /// Size of the image
        size: usize,
        /// Bytes required to reach the end of the header block
        needed: usize,
    },
}

/// Type alias for Results from ROM inspection
pub type Result<T> = std::result::Result<T, SmsError>;
