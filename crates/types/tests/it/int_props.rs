//! Property-based tests for the integer codec.
//!
//! These tests verify wire-critical invariants:
//! - every integer survives encode then decode unchanged
//! - the encoding carries no redundant leading sign-extension byte
//! - the encoding agrees with the length a two's-complement byte count requires

use ee_types::{decode_int, encode_int, BigInt, Sign};
use proptest::prelude::*;

/// True when the first byte only repeats the sign the second byte already carries.
fn has_redundant_prefix(bytes: &[u8]) -> bool {
    match bytes {
        [0x00, next, ..] => next & 0x80 == 0,
        [0xff, next, ..] => next & 0x80 != 0,
        _ => false,
    }
}

/// Minimal byte count for a two's-complement representation of `v`.
fn expected_len(v: &BigInt) -> usize {
    if v.sign() == Sign::NoSign {
        return 0;
    }
    // negative values need bits for |v| - 1 plus a sign bit
    let magnitude = if v.sign() == Sign::Minus { -v - 1 } else { v.clone() };
    (magnitude.bits() as usize + 8) / 8
}

#[test]
fn test_boundary_values_roundtrip() {
    let boundaries: Vec<BigInt> = vec![
        BigInt::from(0),
        BigInt::from(1),
        BigInt::from(-1),
        BigInt::from(127),
        BigInt::from(128),
        BigInt::from(-128),
        BigInt::from(-129),
        BigInt::from(255),
        BigInt::from(256),
        BigInt::from(32767),
        BigInt::from(32768),
        BigInt::from(-32768),
        BigInt::from(-32769),
        BigInt::from(i64::MAX),
        BigInt::from(i64::MIN),
        BigInt::from(u64::MAX),
        BigInt::from(i128::MAX),
        BigInt::from(i128::MIN),
        BigInt::from(1) << 255usize,
        -(BigInt::from(1) << 255usize),
    ];

    for v in boundaries {
        let bytes = encode_int(&v);
        assert_eq!(decode_int(&bytes), v, "roundtrip failed for {v}");
        assert!(!has_redundant_prefix(&bytes), "redundant prefix for {v}: {bytes:02x?}");
        assert_eq!(bytes.len(), expected_len(&v), "wrong length for {v}");
    }
}

proptest! {
    /// Any 128-bit integer survives the codec unchanged.
    #[test]
    fn prop_int_roundtrip(v in any::<i128>()) {
        let v = BigInt::from(v);
        let bytes = encode_int(&v);
        prop_assert_eq!(decode_int(&bytes), v);
    }

    /// Encodings are minimal.
    #[test]
    fn prop_int_minimal(v in any::<i128>()) {
        let v = BigInt::from(v);
        let bytes = encode_int(&v);
        prop_assert!(!has_redundant_prefix(&bytes), "redundant prefix for {}: {:02x?}", v, bytes);
        prop_assert_eq!(bytes.len(), expected_len(&v));
    }

    /// Arbitrary byte strings decode to a value whose encoding is the minimal form of the input.
    #[test]
    fn prop_decode_then_encode_strips_sign_extension(bytes in proptest::collection::vec(any::<u8>(), 0..40)) {
        let v = decode_int(&bytes);
        let minimal = encode_int(&v);
        prop_assert!(minimal.len() <= bytes.len());
        prop_assert_eq!(decode_int(&minimal), v);
    }

    /// Wide integers beyond 128 bits, built from random limbs.
    #[test]
    fn prop_wide_int_roundtrip(limbs in proptest::collection::vec(any::<u32>(), 1..12), negative in any::<bool>()) {
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        let v = BigInt::from_slice(sign, &limbs);
        prop_assert_eq!(decode_int(&encode_int(&v)), v);
    }
}
