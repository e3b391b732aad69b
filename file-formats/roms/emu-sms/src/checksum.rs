//! BIOS-style ROM checksum

use crate::header::HEADER_SIZE;

/// Wrapping 16-bit sum of the image, excluding the header block
///
/// Covers `0..header_offset` and, when `standard_size` reaches past the header
/// block, `header_offset + 16..standard_size`. Bytes past the end of `data`
/// are not counted.
pub fn compute_checksum(data: &[u8], header_offset: usize, standard_size: usize) -> u16 {
    let before_header = &data[..header_offset.min(data.len())];
    let mut checksum = wrapping_sum(0, before_header);

    let after_header = header_offset + HEADER_SIZE;
    let end = standard_size.min(data.len());
    if end > after_header {
        checksum = wrapping_sum(checksum, &data[after_header..end]);
    }

    checksum
}

fn wrapping_sum(start: u16, bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(start, |sum, &byte| sum.wrapping_add(u16::from(byte)))
}
