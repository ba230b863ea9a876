use std::fmt;

use tracing::{debug, trace};

use crate::codec::ascii_to_bytes;
use crate::format::{hex_string, DOUBLE_SIZE, WAVEFORM_HEADER_LEN};
use crate::reader::{fits_doubles, ReadableCursor};
use crate::writer::AppendableSink;

/// Owned byte sequence with a forward-only read cursor.
///
/// # Invariants
/// - `0 <= index <= bytes.len()` after every operation.
/// - Appending grows `bytes` at the tail and leaves `index` alone.
/// - Every accessor that hands out owned bytes returns an independent copy.
///
/// One buffer serves one decode session. It has no interior mutability;
/// callers that share one across threads serialize access themselves.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    bytes: Vec<u8>,
    index: usize,
}

impl ByteBuffer {
    /// Wrap an owned payload. The cursor starts at 0.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, index: 0 }
    }

    /// Wrap `text` encoded as 7-bit ASCII.
    pub fn from_ascii(text: &str) -> Self {
        Self::new(ascii_to_bytes(text))
    }

    /// Total length of the owned sequence, independent of the cursor.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The whole sequence, independent of the cursor.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copy of the first `len` bytes of the sequence, zero-padded when `len`
    /// exceeds the sequence length.
    pub fn raw_bytes_prefix(&self, len: usize) -> Vec<u8> {
        self.raw_bytes_range(0, len)
    }

    /// Copy of `[from, to)`, zero-padded past the end. Empty if `from >= to`.
    pub fn raw_bytes_range(&self, from: usize, to: usize) -> Vec<u8> {
        if from >= to {
            return Vec::new();
        }
        let mut out = vec![0u8; to - from];
        let end = to.min(self.bytes.len());
        if from < end {
            out[..end - from].copy_from_slice(&self.bytes[from..end]);
        }
        out
    }

    /// Give back the owned sequence.
    pub fn into_inner(self) -> Vec<u8> {
        self.bytes
    }

    /// Upper-case hex of every byte, or `None` for an empty sequence.
    pub fn hex_dump(&self) -> Option<String> {
        if self.bytes.is_empty() {
            None
        } else {
            Some(hex_string(&self.bytes))
        }
    }

    /// Validate the length prefix of a double array and return the declared
    /// element count, or `None` when the body would run past the end.
    fn declared_doubles(&mut self) -> Option<usize> {
        let n = self.read_unsigned_int();
        if !fits_doubles(self.remaining(), n) {
            debug!(declared = n, remaining = self.remaining(), "sampled array longer than payload");
            return None;
        }
        // The guard bounds n * 8 by the remaining bytes, so this fits.
        Some(n as usize)
    }

    /// Keep one of every `sample_rate` doubles out of the next `count`, then
    /// land the cursor on the end of those `count` doubles.
    ///
    /// The final skip of each step may clamp at the buffer end or run past
    /// the declared region; the assignment afterwards is what positions the
    /// cursor, not the loop arithmetic.
    fn decimate_into(&mut self, count: usize, sample_rate: usize, out: &mut Vec<f64>) {
        let start = self.index;
        let skip = (sample_rate - 1).saturating_mul(DOUBLE_SIZE);
        for _ in (0..count).step_by(sample_rate) {
            out.push(self.read_double());
            self.ignore(skip);
        }
        self.index = start + count * DOUBLE_SIZE;
        trace!(count, sample_rate, kept = out.len(), "decimated doubles");
    }
}

impl ReadableCursor for ByteBuffer {
    #[inline]
    fn position(&self) -> usize {
        self.index
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.bytes.len() - self.index
    }

    fn readable_bytes(&self) -> Vec<u8> {
        self.bytes[self.index..].to_vec()
    }

    fn peek_bytes(&self, l: usize) -> Vec<u8> {
        let end = self.index.saturating_add(l).min(self.bytes.len());
        self.bytes[self.index..end].to_vec()
    }

    /// When `l` exceeds `remaining()` only the available bytes are copied
    /// and the cursor stops at the end.
    fn read_bytes(&mut self, l: usize) -> Vec<u8> {
        let end = self.index.saturating_add(l).min(self.bytes.len());
        let v = self.bytes[self.index..end].to_vec();
        self.index = end;
        v
    }

    fn ignore(&mut self, l: usize) {
        if self.remaining() > l {
            self.index += l;
        } else {
            self.index = self.bytes.len();
        }
    }

    fn read_double_array_sampled(&mut self, sample_rate: usize) -> Vec<f64> {
        if sample_rate <= 1 {
            return self.read_double_array();
        }
        let Some(n) = self.declared_doubles() else {
            return Vec::new();
        };
        let mut doubles = Vec::with_capacity(n.div_ceil(sample_rate));
        self.decimate_into(n, sample_rate, &mut doubles);
        doubles
    }

    fn read_sampled_waveform(&mut self, sample_rate: usize) -> Vec<f64> {
        if sample_rate <= 1 {
            return self.read_double_array();
        }
        let Some(n) = self.declared_doubles() else {
            return Vec::new();
        };
        if n < WAVEFORM_HEADER_LEN {
            // The declaration cannot even hold the header: take what it does
            // declare and default the rest, without reading past it.
            let mut waveform: Vec<f64> = (0..n).map(|_| self.read_double()).collect();
            waveform.resize(WAVEFORM_HEADER_LEN, 0.0);
            return waveform;
        }
        let samples = n - WAVEFORM_HEADER_LEN;
        let mut waveform =
            Vec::with_capacity(WAVEFORM_HEADER_LEN + samples.div_ceil(sample_rate));
        let t0 = self.read_double();
        let delta_t = self.read_double();
        waveform.push(t0);
        waveform.push(delta_t);
        self.decimate_into(samples, sample_rate, &mut waveform);
        waveform
    }
}

impl AppendableSink for ByteBuffer {
    fn append(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl From<&str> for ByteBuffer {
    fn from(text: &str) -> Self {
        Self::from_ascii(text)
    }
}

/// Hex of the whole sequence, e.g. `00 01 0A FF`. Empty for an empty buffer.
impl fmt::Display for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex_string(&self.bytes))
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.bytes.len())
            .field("index", &self.index)
            .field("bytes", &hex_string(&self.bytes))
            .finish()
    }
}
