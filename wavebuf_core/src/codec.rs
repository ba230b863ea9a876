//! Big-endian conversions between fixed-width byte sequences and numbers.
//!
//! Every decoder accepts exactly one input width. A slice of any other length
//! is treated as malformed and decodes to zero instead of failing, which is
//! the same degradation policy the buffer applies to short reads.

/// Encode `v` as 4 big-endian two's complement bytes.
pub fn int_to_bytes(v: i32) -> [u8; 4] {
    [
        ((v >> 24) & 0xff) as u8,
        ((v >> 16) & 0xff) as u8,
        ((v >> 8) & 0xff) as u8,
        (v & 0xff) as u8,
    ]
}

/// Decode a big-endian `i16` from exactly 2 bytes, or 0.
pub fn bytes_to_short(v: &[u8]) -> i16 {
    match v {
        [hi, lo] => ((*hi as i16) << 8) | *lo as i16,
        _ => 0,
    }
}

/// Decode a big-endian `i32` from exactly 4 bytes, or 0.
pub fn bytes_to_int(v: &[u8]) -> i32 {
    match v {
        [b0, b1, b2, b3] => {
            (*b0 as i32) << 24 | (*b1 as i32) << 16 | (*b2 as i32) << 8 | *b3 as i32
        }
        _ => 0,
    }
}

/// Decode a big-endian `i64` from exactly 8 bytes, or 0.
///
/// The most significant byte comes first: each byte is OR-ed in after the
/// accumulator has been shifted left by 8 bits.
pub fn bytes_to_long(v: &[u8]) -> i64 {
    if v.len() != 8 {
        return 0;
    }
    v.iter().fold(0i64, |num, &b| (num << 8) | b as i64)
}

/// Decode an IEEE-754 binary64 from exactly 8 big-endian bytes, or 0.0.
///
/// This is a bit-pattern reinterpretation of [`bytes_to_long`], not a
/// numeric cast, so NaN payloads and signed zeros survive unchanged.
pub fn bytes_to_double(v: &[u8]) -> f64 {
    if v.len() != 8 {
        return 0.0;
    }
    f64::from_bits(bytes_to_long(v) as u64)
}

/// Encode text as 7-bit ASCII. Characters outside the range become `?`.
pub fn ascii_to_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

/// Decode 7-bit ASCII. Bytes above 0x7F become U+FFFD.
pub fn bytes_to_ascii(v: &[u8]) -> String {
    v.iter()
        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_replaces_out_of_range() {
        assert_eq!(ascii_to_bytes("tag-1"), b"tag-1".to_vec());
        assert_eq!(ascii_to_bytes("µs"), b"?s".to_vec());
        assert_eq!(bytes_to_ascii(b"ch0"), "ch0");
        assert_eq!(bytes_to_ascii(&[b'a', 0xc2, b'b']), "a\u{FFFD}b");
    }

    #[test]
    fn int_to_bytes_is_big_endian() {
        assert_eq!(int_to_bytes(0x0102_0304), [0x01, 0x02, 0x03, 0x04]);
        assert_eq!(int_to_bytes(-1), [0xff; 4]);
        assert_eq!(int_to_bytes(i32::MIN), [0x80, 0, 0, 0]);
    }

    #[test]
    fn short_sign_extends() {
        assert_eq!(bytes_to_short(&[0xff, 0xfe]), -2);
        assert_eq!(bytes_to_short(&[0x7f, 0xff]), i16::MAX);
        assert_eq!(bytes_to_short(&[0x00, 0x80]), 0x80);
    }

    #[test]
    fn int_matches_std() {
        let raw = [0xde, 0xad, 0xbe, 0xef];
        assert_eq!(bytes_to_int(&raw), i32::from_be_bytes(raw));
    }

    #[test]
    fn long_matches_std() {
        let raw = [0x80, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0xff];
        assert_eq!(bytes_to_long(&raw), i64::from_be_bytes(raw));
    }

    #[test]
    fn double_is_bit_reinterpretation() {
        assert_eq!(bytes_to_double(&1.5f64.to_be_bytes()), 1.5);
        let neg_zero = bytes_to_double(&(-0.0f64).to_be_bytes());
        assert!(neg_zero.is_sign_negative());
        let nan_bits = 0x7ff8_0000_0000_0042u64;
        assert_eq!(
            bytes_to_double(&nan_bits.to_be_bytes()).to_bits(),
            nan_bits
        );
    }

    #[test]
    fn wrong_length_decodes_to_zero() {
        assert_eq!(bytes_to_short(&[]), 0);
        assert_eq!(bytes_to_short(&[1, 2, 3]), 0);
        assert_eq!(bytes_to_int(&[1, 2, 3]), 0);
        assert_eq!(bytes_to_int(&[1, 2, 3, 4, 5]), 0);
        assert_eq!(bytes_to_long(&[1; 7]), 0);
        assert_eq!(bytes_to_long(&[1; 9]), 0);
        assert_eq!(bytes_to_double(&[0x3f; 4]), 0.0);
    }
}
