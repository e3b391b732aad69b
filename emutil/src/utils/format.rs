//! Formatting utilities

use humansize::{DECIMAL, format_size};

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a percentage
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Share of `part` in `total` as a percentage
pub fn format_share(part: u64, total: u64) -> String {
    if total == 0 {
        "N/A".to_string()
    } else {
        format_percentage(part as f64 / total as f64 * 100.0)
    }
}

/// Format a CRC-32 value
pub fn format_crc(crc: u32) -> String {
    format!("{crc:08X}")
}

/// Format a checksum that may not have been computed
pub fn format_checksum(checksum: Option<u16>) -> String {
    match checksum {
        Some(value) => format!("0x{value:04X}"),
        None => "N/A".to_string(),
    }
}
