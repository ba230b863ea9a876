use crate::codec::{ascii_to_bytes, int_to_bytes};

/// Append capability: grows the owned sequence at its tail.
///
/// Appending never moves a read cursor. Each call returns the sink again so
/// payloads can be assembled in one expression:
///
/// ```
/// use wavebuf_core::{AppendableSink, ByteBuffer};
///
/// let mut buf = ByteBuffer::default();
/// buf.append_int(3).append_str("abc").append(&[0x01]);
/// assert_eq!(buf.raw_bytes(), &[0, 0, 0, 3, b'a', b'b', b'c', 1]);
/// ```
pub trait AppendableSink {
    fn append(&mut self, bytes: &[u8]) -> &mut Self;

    /// Append `s` as 7-bit ASCII.
    fn append_str(&mut self, s: &str) -> &mut Self {
        self.append(&ascii_to_bytes(s))
    }

    /// Append `v` as 4 big-endian bytes.
    fn append_int(&mut self, v: i32) -> &mut Self {
        self.append(&int_to_bytes(v))
    }
}

impl AppendableSink for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> &mut Self {
        self.extend_from_slice(bytes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_chains() {
        let mut out = Vec::new();
        AppendableSink::append(&mut out, &[0xaa])
            .append_int(-2)
            .append_str("x");
        assert_eq!(out, vec![0xaa, 0xff, 0xff, 0xff, 0xfe, b'x']);
    }
}
