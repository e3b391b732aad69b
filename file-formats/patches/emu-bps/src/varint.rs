//! Variable-length integers used by the BPS action stream
//!
//! Each byte carries 7 value bits; a set high bit marks the last byte. Every
//! continuation adds `1 << shift` on top of the value bits, so each encoded
//! length covers its own range of values and there are no redundant
//! encodings (`0x80` is 0, `0x00 0x80` is 128, never 0).

use byteorder::ReadBytesExt;
use std::io::Cursor;

use crate::{BpsError, Result};

/// Longest possible encoding of a u64
pub const MAX_VARINT_LEN: usize = 10;

/// Read one variable-length integer
pub fn read_varint(reader: &mut Cursor<&[u8]>) -> Result<u64> {
    // Sums up to shift 63 fit easily in 128 bits; the range check happens at the end.
    let mut result: u128 = 0;
    let mut shift: u32 = 0;

    loop {
        let offset = reader.position();
        let byte = reader.read_u8().map_err(|_| {
            BpsError::invalid_format(offset, "patch ends inside a variable-length integer")
        })?;

        result += u128::from(byte & 0x7f) << shift;
        if byte & 0x80 != 0 {
            return u64::try_from(result).map_err(|_| BpsError::MalformedInteger { offset });
        }

        shift += 7;
        if shift > 63 {
            return Err(BpsError::MalformedInteger { offset });
        }
        result += 1u128 << shift;
    }
}

/// Read a signed relative offset: bit 0 is the sign, the rest the magnitude
pub fn read_signed_offset(reader: &mut Cursor<&[u8]>) -> Result<i64> {
    let raw = read_varint(reader)?;
    let magnitude = (raw >> 1) as i64;
    Ok(if raw & 1 == 1 { -magnitude } else { magnitude })
}

/// Append the encoding of `value`
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let bits = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(0x80 | bits);
            return;
        }
        out.push(bits);
        value -= 1;
    }
}

/// Append the encoding of a signed relative offset.
///
/// `i64::MIN` has no representation; its magnitude does not fit in 63 bits.
pub fn encode_signed_offset(value: i64, out: &mut Vec<u8>) {
    let raw = (value.unsigned_abs() << 1) | u64::from(value < 0);
    encode_varint(raw, out);
}

/// Number of bytes `value` occupies when encoded
pub fn encoded_len(value: u64) -> usize {
    let mut len = 1;
    let mut remaining = value >> 7;
    while remaining != 0 {
        remaining -= 1;
        remaining >>= 7;
        len += 1;
    }
    len
}
