//! Whole-image inspection and validation

use std::fmt;
use std::fs;
use std::path::Path;

use emu_utils::{Diagnostics, FileRole};

use crate::digest::RomDigests;
use crate::header::RomHeaderRecord;
use crate::size::check_rom_size;
use crate::Result;

/// Console an image targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum RomKind {
    /// Sega Master System
    #[default]
    MasterSystem,
    /// Sega Game Gear
    GameGear,
}

impl RomKind {
    /// Guess from the file extension: `.gg` (any case) is Game Gear,
    /// everything else Master System
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gg") => RomKind::GameGear,
            _ => RomKind::MasterSystem,
        }
    }
}

impl fmt::Display for RomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomKind::MasterSystem => write!(f, "Master System"),
            RomKind::GameGear => write!(f, "Game Gear"),
        }
    }
}

/// A problem found while validating an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ValidationError {
    /// Declared and computed checksum differ
    ChecksumMismatch,
    /// Declared size differs from the image size
    RomSizeMismatch,
}

impl ValidationError {
    /// Short stable code
    pub fn code(self) -> &'static str {
        match self {
            ValidationError::ChecksumMismatch => "CKS",
            ValidationError::RomSizeMismatch => "RSZ",
        }
    }

    /// Message suitable for end users
    pub fn user_message(self) -> &'static str {
        match self {
            ValidationError::ChecksumMismatch => "ROM checksum error",
            ValidationError::RomSizeMismatch => {
                "ROM size code does not match actual file size"
            }
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.user_message())
    }
}

/// A ROM image held in memory
#[derive(Debug, Clone)]
pub struct RomImage {
    data: Vec<u8>,
    kind: RomKind,
}

impl RomImage {
    /// Read an image from disk, rejecting it before reading if it is larger
    /// than [`MAX_ROM_SIZE`](crate::MAX_ROM_SIZE). The kind is taken from the
    /// extension.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let size = fs::metadata(path)?.len();
        check_rom_size(size)?;

        let data = fs::read(path)?;
        log::debug!("Read {} bytes from {}", data.len(), path.display());

        Ok(Self {
            data,
            kind: RomKind::from_path(path),
        })
    }

    /// Wrap bytes already in memory
    pub fn from_bytes(data: Vec<u8>, kind: RomKind) -> Result<Self> {
        check_rom_size(data.len() as u64)?;
        Ok(Self { data, kind })
    }

    /// Override the detected kind
    pub fn with_kind(mut self, kind: RomKind) -> Self {
        self.kind = kind;
        self
    }

    /// Raw image bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Console the image targets
    pub fn kind(&self) -> RomKind {
        self.kind
    }

    /// Image size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Everything learned about an image
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RomReport {
    /// Header fields and checksum result
    pub header: RomHeaderRecord,
    /// Content digests
    pub digests: RomDigests,
    /// Validation problems, in reporting order
    pub validation_errors: Vec<ValidationError>,
}

impl RomReport {
    /// Whether validation found nothing wrong
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }
}

/// Inspect `image`, reporting progress and validation problems to
/// `diagnostics`
///
/// Each validation error is also reported as a source error against the
/// input ROM at the offset of the offending header field. Only an image too
/// small to hold a header block is an error.
pub fn inspect(image: &RomImage, diagnostics: &mut dyn Diagnostics) -> Result<RomReport> {
    diagnostics.on_debug_message(&format!(
        "Inspecting {} image of {} bytes",
        image.kind(),
        image.len()
    ));

    let digests = RomDigests::compute(image.data());
    for (scheme, digest) in digests.entries() {
        diagnostics.on_debug_message(&format!("ROM hash ({scheme}): {digest}"));
    }

    let header = RomHeaderRecord::read(image.data(), image.kind())?;
    diagnostics.on_debug_message(&format!(
        "Header at 0x{:04X}{}",
        header.header_offset,
        if header.signature_present {
            ""
        } else {
            " (no TMR SEGA signature)"
        }
    ));
    diagnostics.on_debug_message(&format!(
        "Declared checksum: 0x{:04X}",
        header.declared_checksum
    ));
    match header.computed_checksum {
        Some(checksum) => {
            diagnostics.on_debug_message(&format!("Actual checksum: 0x{checksum:04X}"));
        }
        None => diagnostics.on_debug_message("Checksum not computed: unknown ROM size code"),
    }
    match header.declared_size() {
        Some(size) => diagnostics.on_debug_message(&format!(
            "Declared size: {} bytes ({}K)",
            size,
            size / 1024
        )),
        None => diagnostics.on_debug_message(&format!(
            "Unknown ROM size specifier: 0x{:X}",
            header.size_region_code & 0x0F
        )),
    }
    diagnostics.on_debug_message(&format!("Region: {}", header.region()));

    let validation_errors = header.validation_errors();
    for error in &validation_errors {
        let offset = match error {
            ValidationError::ChecksumMismatch => header.checksum_field_offset(),
            ValidationError::RomSizeMismatch => header.size_field_offset(),
        };
        log::warn!("{error}");
        diagnostics.on_source_error(FileRole::InputRom, offset as u64, error.user_message());
    }

    Ok(RomReport {
        header,
        digests,
        validation_errors,
    })
}
