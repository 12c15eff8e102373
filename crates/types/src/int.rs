//! Integer codec.
//!
//! Integers travel as the shortest big-endian two's-complement byte string, matching the byte
//! form the peer's native big integer produces. Zero is the empty string.
//!
//! Any deviation from this form is not caught by framing: the peer silently reads a different
//! value.

use num_bigint::{BigInt, Sign};

/// Encode an integer as minimal big-endian two's complement.
///
/// The result never carries a redundant leading `0x00` or `0xff` byte.
pub fn encode_int(value: &BigInt) -> Vec<u8> {
    if value.sign() == Sign::NoSign {
        return Vec::new();
    }

    let mut bytes = value.to_signed_bytes_be();

    // drop sign-extension bytes the top bit of the next byte already implies
    let redundant = bytes
        .windows(2)
        .take_while(|pair| {
            (pair[0] == 0x00 && pair[1] & 0x80 == 0) || (pair[0] == 0xff && pair[1] & 0x80 != 0)
        })
        .count();
    bytes.drain(..redundant);
    bytes
}

/// Decode big-endian two's complement, sign-extended from the most significant bit.
///
/// The empty string decodes to zero.
pub fn decode_int(bytes: &[u8]) -> BigInt {
    if bytes.is_empty() {
        return BigInt::default();
    }
    BigInt::from_signed_bytes_be(bytes)
}
