//! ROM header block parsing

use std::fmt;

use byteorder::{ByteOrder, LittleEndian};

use crate::checksum::compute_checksum;
use crate::inspector::{RomKind, ValidationError};
use crate::size::standard_rom_size;
use crate::{Result, SmsError};

/// Length of the header block
pub const HEADER_SIZE: usize = 16;

/// Signature found at the start of a licensed header
pub const TMR_SEGA: &[u8; 8] = b"TMR SEGA";

const CHECKSUM_OFFSET: usize = 0x0A;
const SIZE_REGION_OFFSET: usize = 0x0F;

/// Header offset for an image of `len` bytes
pub fn header_offset(len: usize) -> usize {
    match len {
        0x2000 => 0x1FF0,
        0x4000 => 0x3FF0,
        _ => 0x7FF0,
    }
}

/// Region code from the high nibble of the size/region byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Region {
    /// SMS Japan
    SmsJapan,
    /// SMS Export
    SmsExport,
    /// GG Japan
    GameGearJapan,
    /// GG Export
    GameGearExport,
    /// GG International
    GameGearInternational,
    /// Any other nibble
    Unknown(u8),
}

impl Region {
    /// Decode from the size/region byte
    pub fn from_code(code: u8) -> Self {
        match code >> 4 {
            3 => Region::SmsJapan,
            4 => Region::SmsExport,
            5 => Region::GameGearJapan,
            6 => Region::GameGearExport,
            7 => Region::GameGearInternational,
            other => Region::Unknown(other),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::SmsJapan => write!(f, "SMS Japan"),
            Region::SmsExport => write!(f, "SMS Export"),
            Region::GameGearJapan => write!(f, "GG Japan"),
            Region::GameGearExport => write!(f, "GG Export"),
            Region::GameGearInternational => write!(f, "GG International"),
            Region::Unknown(nibble) => write!(f, "Unknown ({nibble:X})"),
        }
    }
}

/// Header fields read from an image together with the checksum recomputed
/// over that image
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RomHeaderRecord {
    /// Kind of console the image targets
    pub kind: RomKind,
    /// Size of the image in bytes
    pub actual_size: usize,
    /// Offset of the header block
    pub header_offset: usize,
    /// Whether the block starts with `TMR SEGA`
    pub signature_present: bool,
    /// Little-endian checksum stored at `header_offset + 0x0A`
    pub declared_checksum: u16,
    /// Byte stored at `header_offset + 0x0F`
    pub size_region_code: u8,
    /// Checksum over the image; `None` when the size code is undefined
    pub computed_checksum: Option<u16>,
}

impl RomHeaderRecord {
    /// Locate and read the header block of `data`
    pub fn read(data: &[u8], kind: RomKind) -> Result<Self> {
        let header_offset = header_offset(data.len());
        let needed = header_offset + HEADER_SIZE;
        if data.len() < needed {
            return Err(SmsError::RomTooSmall {
                size: data.len(),
                needed,
            });
        }

        let block = &data[header_offset..needed];
        let declared_checksum = LittleEndian::read_u16(&block[CHECKSUM_OFFSET..]);
        let size_region_code = block[SIZE_REGION_OFFSET];
        let computed_checksum = standard_rom_size(size_region_code)
            .map(|size| compute_checksum(data, header_offset, size));

        Ok(Self {
            kind,
            actual_size: data.len(),
            header_offset,
            signature_present: block.starts_with(TMR_SEGA),
            declared_checksum,
            size_region_code,
            computed_checksum,
        })
    }

    /// Size declared by the size code, if defined
    pub fn declared_size(&self) -> Option<usize> {
        standard_rom_size(self.size_region_code)
    }

    /// Region declared by the size/region code
    pub fn region(&self) -> Region {
        Region::from_code(self.size_region_code)
    }

    /// Whether the recomputed checksum equals the declared one
    pub fn has_checksum_match(&self) -> bool {
        self.computed_checksum == Some(self.declared_checksum)
    }

    /// Absolute offset of the checksum field
    pub fn checksum_field_offset(&self) -> usize {
        self.header_offset + CHECKSUM_OFFSET
    }

    /// Absolute offset of the size/region byte
    pub fn size_field_offset(&self) -> usize {
        self.header_offset + SIZE_REGION_OFFSET
    }

    /// Problems with the image, in a fixed order
    ///
    /// A checksum mismatch is only reported for Game Gear images. An
    /// undefined size code leaves nothing to compare against, so a Game Gear
    /// image with one always reports a mismatch, whatever it declares.
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if self.kind == RomKind::GameGear && !self.has_checksum_match() {
            errors.push(ValidationError::ChecksumMismatch);
        }
        if self.declared_size() != Some(self.actual_size) {
            errors.push(ValidationError::RomSizeMismatch);
        }
        errors
    }
}
