//! ROM size codes and the size ceiling

use crate::{Result, SmsError};

/// Largest image accepted for inspection (32 MiB)
pub const MAX_ROM_SIZE: u64 = 32 * 1024 * 1024;

/// Reject images above [`MAX_ROM_SIZE`]
pub fn check_rom_size(size: u64) -> Result<()> {
    if size > MAX_ROM_SIZE {
        return Err(SmsError::RomTooLarge {
            size,
            max: MAX_ROM_SIZE,
        });
    }
    Ok(())
}

/// Size in bytes declared by the low nibble of the size/region code
///
/// Returns `None` for codes the BIOS does not define.
pub fn standard_rom_size(code: u8) -> Option<usize> {
    const KIB: usize = 1024;
    match code & 0x0F {
        0xA => Some(8 * KIB),
        0xB => Some(16 * KIB),
        0xC => Some(32 * KIB),
        0xD => Some(48 * KIB),
        0xE => Some(64 * KIB),
        0xF => Some(128 * KIB),
        0x0 => Some(256 * KIB),
        0x1 => Some(512 * KIB),
        0x2 => Some(1024 * KIB),
        _ => None,
    }
}
