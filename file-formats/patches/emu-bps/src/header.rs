//! BPS header and trailer parsing

use byteorder::{LittleEndian, ReadBytesExt};
use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use crate::action::PatchActions;
use crate::varint::read_varint;
use crate::{BpsError, Result};

/// Magic signature at the start of every BPS patch
pub const BPS_MAGIC: [u8; 4] = *b"BPS1";

/// Layout of the checksum trailer at the end of the patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailerLayout {
    /// A single CRC-32 of the patched image
    #[default]
    TargetOnly,
    /// Source, target and patch CRC-32s, in that order
    Full,
}

impl TrailerLayout {
    /// Size of the trailer in bytes
    pub fn size(self) -> usize {
        match self {
            TrailerLayout::TargetOnly => 4,
            TrailerLayout::Full => 12,
        }
    }
}

impl FromStr for TrailerLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "target-only" | "target" | "single" => Ok(TrailerLayout::TargetOnly),
            "full" | "all" => Ok(TrailerLayout::Full),
            _ => Err(format!("Unknown trailer layout: {s}")),
        }
    }
}

impl fmt::Display for TrailerLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailerLayout::TargetOnly => write!(f, "target-only"),
            TrailerLayout::Full => write!(f, "full"),
        }
    }
}

/// Fixed fields at the start of a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchHeader {
    /// Size the source must have
    pub source_size: u64,
    /// Size of the patched image
    pub target_size: u64,
    /// Free-form metadata, usually XML or plain text
    pub metadata: Vec<u8>,
}

impl PatchHeader {
    /// Parse the magic, sizes and metadata
    ///
    /// Leaves the reader positioned at the first action.
    pub fn parse(reader: &mut Cursor<&[u8]>) -> Result<Self> {
        for (i, &expected) in BPS_MAGIC.iter().enumerate() {
            let offset = reader.position();
            let found = reader.read_u8().map_err(|_| {
                BpsError::invalid_format(offset, "patch ends inside the BPS1 signature")
            })?;
            if found != expected {
                return Err(BpsError::invalid_format(
                    i as u64,
                    format!("invalid signature byte: expected 0x{expected:02X}, found 0x{found:02X}"),
                ));
            }
        }

        let source_size = read_varint(reader)?;
        let target_size = read_varint(reader)?;
        let metadata_offset = reader.position();
        let metadata_size = read_varint(reader)?;

        log::debug!(
            "BPS header: source={source_size}, target={target_size}, metadata={metadata_size}"
        );

        let data = *reader.get_ref();
        let start = reader.position() as usize;
        let end = usize::try_from(metadata_size)
            .ok()
            .and_then(|size| start.checked_add(size))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                BpsError::invalid_format(
                    metadata_offset,
                    format!("metadata size {metadata_size} exceeds the patch"),
                )
            })?;

        let metadata = data[start..end].to_vec();
        reader.set_position(end as u64);

        Ok(PatchHeader {
            source_size,
            target_size,
            metadata,
        })
    }

    /// Metadata as text, with invalid UTF-8 replaced
    pub fn metadata_text(&self) -> Option<Cow<'_, str>> {
        if self.metadata.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.metadata))
        }
    }
}

/// Checksums declared at the end of the patch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchTrailer {
    /// CRC-32 of the source (full layout only)
    pub source_crc: Option<u32>,
    /// CRC-32 of the patched image
    pub target_crc: u32,
    /// CRC-32 of the patch file minus these final four bytes (full layout only)
    pub patch_crc: Option<u32>,
}

impl PatchTrailer {
    /// Parse a trailer from exactly `layout.size()` bytes
    fn parse(bytes: &[u8], layout: TrailerLayout) -> Result<Self> {
        let mut reader = Cursor::new(bytes);
        match layout {
            TrailerLayout::TargetOnly => Ok(PatchTrailer {
                source_crc: None,
                target_crc: reader.read_u32::<LittleEndian>()?,
                patch_crc: None,
            }),
            TrailerLayout::Full => Ok(PatchTrailer {
                source_crc: Some(reader.read_u32::<LittleEndian>()?),
                target_crc: reader.read_u32::<LittleEndian>()?,
                patch_crc: Some(reader.read_u32::<LittleEndian>()?),
            }),
        }
    }
}

/// A parsed patch: header, trailer and the undecoded action stream
#[derive(Debug, Clone)]
pub struct PatchFile {
    /// Parsed header
    pub header: PatchHeader,
    /// Parsed trailer
    pub trailer: PatchTrailer,
    /// Layout the trailer was read with
    pub layout: TrailerLayout,
    raw: Vec<u8>,
    actions_start: usize,
    actions_end: usize,
}

impl PatchFile {
    /// Parse a patch from its complete contents
    pub fn parse(data: &[u8], layout: TrailerLayout) -> Result<Self> {
        let mut reader = Cursor::new(data);
        let header = PatchHeader::parse(&mut reader)?;

        let actions_start = reader.position() as usize;
        let trailer_size = layout.size();
        if data.len() < actions_start + trailer_size {
            return Err(BpsError::invalid_format(
                data.len() as u64,
                format!(
                    "patch too small: {} bytes, need at least {} for the {layout} trailer",
                    data.len(),
                    actions_start + trailer_size
                ),
            ));
        }

        let actions_end = data.len() - trailer_size;
        let trailer = PatchTrailer::parse(&data[actions_end..], layout)?;

        log::debug!(
            "Parsed BPS patch: actions={} bytes, target crc={:08x}",
            actions_end - actions_start,
            trailer.target_crc
        );

        Ok(PatchFile {
            header,
            trailer,
            layout,
            raw: data.to_vec(),
            actions_start,
            actions_end,
        })
    }

    /// Stream the patch actions in order
    pub fn actions(&self) -> PatchActions<'_> {
        PatchActions::new(&self.raw[..self.actions_end], self.actions_start)
    }

    /// Size of the action stream in bytes
    pub fn actions_len(&self) -> usize {
        self.actions_end - self.actions_start
    }

    /// Size of the whole patch file
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the patch file is empty (never true for a parsed patch)
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// CRC-32 of the patch file excluding its final four bytes
    pub fn computed_patch_crc(&self) -> u32 {
        crc32fast::hash(&self.raw[..self.raw.len() - 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::encode_varint;
    use pretty_assertions::assert_eq;

    fn header_bytes(source: u64, target: u64, metadata: &[u8]) -> Vec<u8> {
        let mut data = BPS_MAGIC.to_vec();
        encode_varint(source, &mut data);
        encode_varint(target, &mut data);
        encode_varint(metadata.len() as u64, &mut data);
        data.extend_from_slice(metadata);
        data
    }

    #[test]
    fn test_parse_header_with_metadata() {
        let data = header_bytes(1024, 2048, b"<patch/>");
        let mut reader = Cursor::new(&data[..]);
        let header = PatchHeader::parse(&mut reader).unwrap();

        assert_eq!(header.source_size, 1024);
        assert_eq!(header.target_size, 2048);
        assert_eq!(header.metadata, b"<patch/>");
        assert_eq!(header.metadata_text().as_deref(), Some("<patch/>"));
        assert_eq!(reader.position() as usize, data.len());
    }

    #[test]
    fn test_bad_magic_reports_offset() {
        let mut data = header_bytes(4, 4, b"");
        data[2] = b'X';
        let err = PatchHeader::parse(&mut Cursor::new(&data[..])).unwrap_err();
        assert!(matches!(err, BpsError::InvalidFormat { offset: 2, .. }));
    }

    #[test]
    fn test_truncated_magic() {
        let err = PatchHeader::parse(&mut Cursor::new(&b"BP"[..])).unwrap_err();
        assert!(matches!(err, BpsError::InvalidFormat { offset: 2, .. }));
    }

    #[test]
    fn test_metadata_past_end() {
        let mut data = BPS_MAGIC.to_vec();
        encode_varint(1, &mut data);
        encode_varint(1, &mut data);
        encode_varint(100, &mut data);
        data.extend_from_slice(b"short");
        let err = PatchHeader::parse(&mut Cursor::new(&data[..])).unwrap_err();
        assert!(matches!(err, BpsError::InvalidFormat { offset: 6, .. }));
    }

    #[test]
    fn test_parse_target_only_trailer() {
        let mut data = header_bytes(0, 0, b"");
        data.extend_from_slice(&0xCAFEBABEu32.to_le_bytes());
        let patch = PatchFile::parse(&data, TrailerLayout::TargetOnly).unwrap();

        assert_eq!(patch.trailer.target_crc, 0xCAFEBABE);
        assert_eq!(patch.trailer.source_crc, None);
        assert_eq!(patch.trailer.patch_crc, None);
        assert_eq!(patch.actions_len(), 0);
        assert_eq!(patch.actions().count(), 0);
    }

    #[test]
    fn test_parse_full_trailer() {
        let mut data = header_bytes(0, 0, b"");
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        let patch_crc = crc32fast::hash(&data);
        data.extend_from_slice(&patch_crc.to_le_bytes());

        let patch = PatchFile::parse(&data, TrailerLayout::Full).unwrap();
        assert_eq!(patch.trailer.source_crc, Some(1));
        assert_eq!(patch.trailer.target_crc, 2);
        assert_eq!(patch.trailer.patch_crc, Some(patch_crc));
        assert_eq!(patch.computed_patch_crc(), patch_crc);
    }

    #[test]
    fn test_too_small_for_trailer() {
        let mut data = header_bytes(0, 0, b"");
        data.extend_from_slice(&[0, 0, 0, 0]);
        assert!(PatchFile::parse(&data, TrailerLayout::TargetOnly).is_ok());
        assert!(matches!(
            PatchFile::parse(&data, TrailerLayout::Full),
            Err(BpsError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_trailer_layout_names() {
        assert_eq!("full".parse::<TrailerLayout>().unwrap(), TrailerLayout::Full);
        assert_eq!(
            "Target-Only".parse::<TrailerLayout>().unwrap(),
            TrailerLayout::TargetOnly
        );
        assert!("triple".parse::<TrailerLayout>().is_err());
        assert_eq!(TrailerLayout::Full.to_string(), "full");
    }
}
