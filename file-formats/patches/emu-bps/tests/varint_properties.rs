//! Property tests for the variable-length integer codec

use std::io::Cursor;

use emu_bps::varint::{
    MAX_VARINT_LEN, encode_signed_offset, encode_varint, encoded_len, read_signed_offset,
    read_varint,
};
use proptest::prelude::*;

fn encode(value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    encode_varint(value, &mut out);
    out
}

proptest! {
    #[test]
    fn varint_round_trips(value in any::<u64>()) {
        let bytes = encode(value);
        let mut reader = Cursor::new(&bytes[..]);
        prop_assert_eq!(read_varint(&mut reader).unwrap(), value);
        prop_assert_eq!(reader.position() as usize, bytes.len());
        prop_assert!(bytes.len() <= MAX_VARINT_LEN);
        prop_assert_eq!(bytes.len(), encoded_len(value));
    }

    #[test]
    fn only_last_byte_terminates(value in any::<u64>()) {
        let bytes = encode(value);
        let (last, rest) = bytes.split_last().unwrap();
        prop_assert!(last & 0x80 != 0);
        prop_assert!(rest.iter().all(|b| b & 0x80 == 0));
    }

    #[test]
    fn distinct_values_have_distinct_encodings(a in any::<u64>(), b in any::<u64>()) {
        prop_assume!(a != b);
        prop_assert_ne!(encode(a), encode(b));
    }

    #[test]
    fn every_terminated_sequence_decodes_to_its_length_class(
        body in proptest::collection::vec(0u8..0x80, 0..8),
        last in 0x80u8..=0xFF,
    ) {
        // Any byte string of this shape is the canonical encoding of exactly one value
        let mut bytes = body;
        bytes.push(last);
        let value = read_varint(&mut Cursor::new(&bytes[..])).unwrap();
        prop_assert_eq!(encode(value), bytes);
    }

    #[test]
    fn signed_offsets_round_trip(value in (i64::MIN + 1)..=i64::MAX) {
        let mut bytes = Vec::new();
        encode_signed_offset(value, &mut bytes);
        prop_assert_eq!(read_signed_offset(&mut Cursor::new(&bytes[..])).unwrap(), value);
    }
}
