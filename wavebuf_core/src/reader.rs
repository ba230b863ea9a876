use tracing::debug;

use crate::codec::{bytes_to_ascii, bytes_to_double, bytes_to_int, bytes_to_long, bytes_to_short};
use crate::format::{Complex, Waveform, BOOLEAN_TRUE, COMPLEX_SIZE, DOUBLE_SIZE};

/// Read capability of a cursor over big-endian wire data.
///
/// # Short-read policy
/// No read in this trait fails. When fewer bytes remain than a value needs,
/// the cursor stays where it is and the type's default comes back: `false`,
/// `0`, `0.0`, `None` or an empty collection. Length-prefixed reads are the
/// one asymmetry: the 4-byte prefix is consumed even when the body it
/// announces turns out to be missing.
///
/// Implementors supply raw byte access and the two decimating reads, which
/// need to reposition the cursor directly. Everything else is provided on
/// top of those.
///
/// Use [`crate::strict::StrictReader`] to turn short reads into errors.
pub trait ReadableCursor {
    /// Current cursor offset from the start of the sequence.
    fn position(&self) -> usize;

    /// Bytes between the cursor and the end of the sequence.
    fn remaining(&self) -> usize;

    /// Copy of every byte from the cursor to the end. Does not move the cursor.
    fn readable_bytes(&self) -> Vec<u8>;

    /// Copy of up to `l` bytes from the cursor, without consuming them.
    fn peek_bytes(&self, l: usize) -> Vec<u8> {
        let mut v = self.readable_bytes();
        v.truncate(l);
        v
    }

    /// Copy and consume exactly `l` bytes.
    ///
    /// Callers check `remaining() >= l` first; the typed reads below all do.
    fn read_bytes(&mut self, l: usize) -> Vec<u8>;

    /// Skip `l` bytes, or jump to the end when `l` is not strictly less than
    /// `remaining()`. Never overshoots.
    fn ignore(&mut self, l: usize);

    /// Length-prefixed double array keeping one element out of every
    /// `sample_rate`. The cursor always ends at the declared array end.
    fn read_double_array_sampled(&mut self, sample_rate: usize) -> Vec<f64>;

    /// Length-prefixed `[t0, delta_t, samples...]` waveform. The header is
    /// never decimated; samples keep one out of every `sample_rate`.
    fn read_sampled_waveform(&mut self, sample_rate: usize) -> Vec<f64>;

    fn read_byte(&mut self) -> i8 {
        if self.remaining() >= 1 {
            self.read_bytes(1)[0] as i8
        } else {
            0
        }
    }

    fn read_unsigned_byte(&mut self) -> u16 {
        if self.remaining() >= 1 {
            self.read_byte() as u8 as u16
        } else {
            0
        }
    }

    /// `true` only for the byte value 1. The byte is consumed either way.
    fn read_boolean(&mut self) -> bool {
        self.remaining() >= 1 && self.read_byte() as u8 == BOOLEAN_TRUE
    }

    fn read_short(&mut self) -> i16 {
        if self.remaining() >= 2 {
            bytes_to_short(&self.read_bytes(2))
        } else {
            0
        }
    }

    fn read_unsigned_short(&mut self) -> u32 {
        if self.remaining() >= 2 {
            self.read_short() as u32 & 0xffff
        } else {
            0
        }
    }

    fn read_int(&mut self) -> i32 {
        if self.remaining() >= 4 {
            bytes_to_int(&self.read_bytes(4))
        } else {
            0
        }
    }

    /// Zero-extended `u32`, the type of every length prefix on the wire.
    fn read_unsigned_int(&mut self) -> u64 {
        if self.remaining() >= 4 {
            self.read_int() as u64 & 0xffff_ffff
        } else {
            0
        }
    }

    fn read_long(&mut self) -> i64 {
        if self.remaining() >= 8 {
            bytes_to_long(&self.read_bytes(8))
        } else {
            0
        }
    }

    fn read_double(&mut self) -> f64 {
        if self.remaining() >= DOUBLE_SIZE {
            bytes_to_double(&self.read_bytes(DOUBLE_SIZE))
        } else {
            0.0
        }
    }

    /// Two consecutive doubles as `re`, `im`.
    fn read_complex(&mut self) -> Option<Complex> {
        if self.remaining() < COMPLEX_SIZE {
            return None;
        }
        let re = self.read_double();
        let im = self.read_double();
        Some(Complex::new(re, im))
    }

    fn read_double_array(&mut self) -> Vec<f64> {
        let n = self.read_unsigned_int();
        if !fits_doubles(self.remaining(), n) {
            debug!(declared = n, remaining = self.remaining(), "double array longer than payload");
            return Vec::new();
        }
        (0..n).map(|_| self.read_double()).collect()
    }

    /// [`read_sampled_waveform`](Self::read_sampled_waveform) split into a
    /// typed header and samples. `None` when nothing could be decoded.
    fn read_waveform(&mut self, sample_rate: usize) -> Option<Waveform> {
        Waveform::from_values(self.read_sampled_waveform(sample_rate))
    }

    /// ASCII text of exactly `l` bytes, or `None` with the cursor untouched.
    fn read_string(&mut self, l: usize) -> Option<String> {
        if self.remaining() >= l {
            Some(bytes_to_ascii(&self.read_bytes(l)))
        } else {
            None
        }
    }

    /// Length-prefixed ASCII text.
    fn read_formatted_string(&mut self) -> Option<String> {
        let l = self.read_unsigned_int();
        if (self.remaining() as u64) < l {
            debug!(declared = l, remaining = self.remaining(), "string longer than payload");
            return None;
        }
        self.read_string(l as usize)
    }

    /// Everything left, as ASCII text. Empty rather than `None` when nothing
    /// remains, since the result is used as a map key downstream.
    fn read_string_to_end(&mut self) -> String {
        let l = self.remaining();
        if l > 0 {
            self.read_string(l).unwrap_or_default()
        } else {
            String::new()
        }
    }
}

/// Whether `n` declared doubles fit in `remaining` bytes.
pub(crate) fn fits_doubles(remaining: usize, n: u64) -> bool {
    n.saturating_mul(DOUBLE_SIZE as u64) <= remaining as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal slice-backed cursor, to check the provided methods do not
    /// depend on `ByteBuffer` internals.
    struct SliceCursor<'a> {
        data: &'a [u8],
        x: usize,
    }

    impl ReadableCursor for SliceCursor<'_> {
        fn position(&self) -> usize {
            self.x
        }

        fn remaining(&self) -> usize {
            self.data.len() - self.x
        }

        fn readable_bytes(&self) -> Vec<u8> {
            self.data[self.x..].to_vec()
        }

        fn read_bytes(&mut self, l: usize) -> Vec<u8> {
            let v = self.data[self.x..self.x + l].to_vec();
            self.x += l;
            v
        }

        fn ignore(&mut self, l: usize) {
            self.x = (self.x + l).min(self.data.len());
        }

        fn read_double_array_sampled(&mut self, _sample_rate: usize) -> Vec<f64> {
            self.read_double_array()
        }

        fn read_sampled_waveform(&mut self, _sample_rate: usize) -> Vec<f64> {
            self.read_double_array()
        }
    }

    #[test]
    fn provided_reads_over_slice() {
        let mut data = vec![0x01, 0xff, 0x80, 0x00];
        data.extend_from_slice(&2.5f64.to_be_bytes());
        data.extend_from_slice(b"ok");
        let mut c = SliceCursor { data: &data, x: 0 };

        assert!(c.read_boolean());
        assert_eq!(c.read_unsigned_byte(), 0xff);
        assert_eq!(c.read_short(), i16::MIN);
        assert_eq!(c.read_double(), 2.5);
        assert_eq!(c.read_string_to_end(), "ok");
        assert_eq!(c.position(), data.len());
        assert_eq!(c.read_long(), 0);
    }

    #[test]
    fn fits_doubles_handles_huge_declarations() {
        assert!(fits_doubles(24, 3));
        assert!(!fits_doubles(23, 3));
        assert!(fits_doubles(0, 0));
        assert!(!fits_doubles(1 << 20, u64::MAX));
        assert!(!fits_doubles(1 << 20, u32::MAX as u64));
    }
}
