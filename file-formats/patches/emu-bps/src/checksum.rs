//! CRC-32 verification of patch inputs and outputs

use std::fmt;

use emu_utils::{Diagnostics, FileRole};

use crate::{BpsError, Result};

/// Which of the trailer checksums is being verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumKind {
    /// CRC-32 of the unpatched source
    Source,
    /// CRC-32 of the patched image
    Target,
    /// CRC-32 of the patch file itself
    Patch,
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumKind::Source => write!(f, "Source"),
            ChecksumKind::Target => write!(f, "Target"),
            ChecksumKind::Patch => write!(f, "Patch"),
        }
    }
}

/// What to do when a checksum disagrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Report through [`Diagnostics::on_source_error`] and keep going
    #[default]
    Lenient,
    /// Fail with [`BpsError::ChecksumMismatch`]
    Strict,
}

/// CRC-32 (IEEE) of `data`
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Compare `actual` against the declared `expected` value under `policy`.
///
/// `offset` is the patch file position the mismatch is reported against.
/// Returns whether the checksums matched.
pub fn verify_crc(
    kind: ChecksumKind,
    expected: u32,
    actual: u32,
    policy: ChecksumPolicy,
    offset: u64,
    diagnostics: &mut dyn Diagnostics,
) -> Result<bool> {
    diagnostics.on_debug_message(&format!(
        "{kind} CRC: declared {expected:08x}, computed {actual:08x}"
    ));

    if expected == actual {
        return Ok(true);
    }

    let error = BpsError::ChecksumMismatch {
        kind,
        expected,
        actual,
    };
    match policy {
        ChecksumPolicy::Strict => Err(error),
        ChecksumPolicy::Lenient => {
            log::warn!("{error}");
            diagnostics.on_source_error(FileRole::PatchFile, offset, &error.to_string());
            Ok(false)
        }
    }
}
