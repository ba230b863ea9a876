//! Fail-fast adapter over the lenient cursor API.
//!
//! [`StrictReader`] checks each read's byte requirement before delegating, so
//! a failed read leaves the cursor exactly where the lenient read would have:
//! untouched for fixed-width values, just past the prefix for length-prefixed
//! ones.

use crate::codec::bytes_to_int;
use crate::error::{DecodeError, DecodeResult};
use crate::format::{Complex, Waveform, COMPLEX_SIZE, DOUBLE_SIZE, LENGTH_PREFIX_SIZE, WAVEFORM_HEADER_LEN};
use crate::reader::ReadableCursor;

/// Borrowing wrapper that turns short reads into [`DecodeError`]s.
///
/// ```
/// use wavebuf_core::{ByteBuffer, DecodeError, StrictReader};
///
/// let mut buf = ByteBuffer::new(vec![0, 0, 0, 7, 1]);
/// let mut r = StrictReader::new(&mut buf);
/// assert_eq!(r.read_int().unwrap(), 7);
/// assert!(matches!(r.read_int(), Err(DecodeError::ShortRead { .. })));
/// ```
pub struct StrictReader<'a, C: ReadableCursor + ?Sized> {
    inner: &'a mut C,
}

impl<'a, C: ReadableCursor + ?Sized> StrictReader<'a, C> {
    pub fn new(inner: &'a mut C) -> Self {
        Self { inner }
    }

    pub fn position(&self) -> usize {
        self.inner.position()
    }

    pub fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    fn need(&self, field: &'static str, needed: u64) -> DecodeResult<()> {
        let remaining = self.inner.remaining();
        if (remaining as u64) < needed {
            return Err(DecodeError::ShortRead {
                field,
                offset: self.inner.position(),
                needed,
                remaining,
            });
        }
        Ok(())
    }

    /// Read a length prefix and check that `width`-byte elements of that
    /// count are present. The prefix stays consumed on failure.
    fn prefixed(&mut self, field: &'static str, width: usize) -> DecodeResult<u64> {
        self.need(field, LENGTH_PREFIX_SIZE as u64)?;
        let n = self.inner.read_unsigned_int();
        self.need(field, n.saturating_mul(width as u64))?;
        Ok(n)
    }

    /// Look at the next length prefix without consuming it.
    fn peek_prefix(&self, field: &'static str) -> DecodeResult<u64> {
        self.need(field, LENGTH_PREFIX_SIZE as u64)?;
        Ok(bytes_to_int(&self.inner.peek_bytes(LENGTH_PREFIX_SIZE)) as u64 & 0xffff_ffff)
    }

    fn check_ascii(&self, l: usize) -> DecodeResult<()> {
        let start = self.inner.position();
        match self
            .inner
            .peek_bytes(l)
            .into_iter()
            .enumerate()
            .find(|(_, b)| !b.is_ascii())
        {
            Some((i, byte)) => Err(DecodeError::NonAscii {
                byte,
                offset: start + i,
            }),
            None => Ok(()),
        }
    }

    pub fn read_bytes(&mut self, l: usize) -> DecodeResult<Vec<u8>> {
        self.need("bytes", l as u64)?;
        Ok(self.inner.read_bytes(l))
    }

    pub fn read_boolean(&mut self) -> DecodeResult<bool> {
        self.need("boolean", 1)?;
        Ok(self.inner.read_boolean())
    }

    pub fn read_byte(&mut self) -> DecodeResult<i8> {
        self.need("byte", 1)?;
        Ok(self.inner.read_byte())
    }

    pub fn read_unsigned_byte(&mut self) -> DecodeResult<u16> {
        self.need("unsigned byte", 1)?;
        Ok(self.inner.read_unsigned_byte())
    }

    pub fn read_short(&mut self) -> DecodeResult<i16> {
        self.need("short", 2)?;
        Ok(self.inner.read_short())
    }

    pub fn read_unsigned_short(&mut self) -> DecodeResult<u32> {
        self.need("unsigned short", 2)?;
        Ok(self.inner.read_unsigned_short())
    }

    pub fn read_int(&mut self) -> DecodeResult<i32> {
        self.need("int", 4)?;
        Ok(self.inner.read_int())
    }

    pub fn read_unsigned_int(&mut self) -> DecodeResult<u64> {
        self.need("unsigned int", 4)?;
        Ok(self.inner.read_unsigned_int())
    }

    pub fn read_long(&mut self) -> DecodeResult<i64> {
        self.need("long", 8)?;
        Ok(self.inner.read_long())
    }

    pub fn read_double(&mut self) -> DecodeResult<f64> {
        self.need("double", DOUBLE_SIZE as u64)?;
        Ok(self.inner.read_double())
    }

    pub fn read_complex(&mut self) -> DecodeResult<Complex> {
        self.need("complex", COMPLEX_SIZE as u64)?;
        let re = self.inner.read_double();
        let im = self.inner.read_double();
        Ok(Complex::new(re, im))
    }

    pub fn read_double_array(&mut self) -> DecodeResult<Vec<f64>> {
        let n = self.prefixed("double array", DOUBLE_SIZE)?;
        Ok((0..n).map(|_| self.inner.read_double()).collect())
    }

    pub fn read_double_array_sampled(&mut self, sample_rate: usize) -> DecodeResult<Vec<f64>> {
        if sample_rate == 0 {
            return Err(DecodeError::InvalidSampleRate);
        }
        let n = self.peek_prefix("double array")?;
        if let Err(e) = self.need("double array", LENGTH_PREFIX_SIZE as u64 + n.saturating_mul(DOUBLE_SIZE as u64)) {
            self.inner.ignore(LENGTH_PREFIX_SIZE);
            return Err(e);
        }
        Ok(self.inner.read_double_array_sampled(sample_rate))
    }

    pub fn read_sampled_waveform(&mut self, sample_rate: usize) -> DecodeResult<Vec<f64>> {
        if sample_rate == 0 {
            return Err(DecodeError::InvalidSampleRate);
        }
        let n = self.peek_prefix("waveform")?;
        let body = LENGTH_PREFIX_SIZE as u64 + n.saturating_mul(DOUBLE_SIZE as u64);
        let check = self.need("waveform", body).and_then(|_| {
            if n < WAVEFORM_HEADER_LEN as u64 {
                Err(DecodeError::ShortRead {
                    field: "waveform header",
                    offset: self.inner.position() + LENGTH_PREFIX_SIZE,
                    needed: (WAVEFORM_HEADER_LEN * DOUBLE_SIZE) as u64,
                    remaining: n as usize * DOUBLE_SIZE,
                })
            } else {
                Ok(())
            }
        });
        if let Err(e) = check {
            self.inner.ignore(LENGTH_PREFIX_SIZE);
            return Err(e);
        }
        Ok(self.inner.read_sampled_waveform(sample_rate))
    }

    pub fn read_waveform(&mut self, sample_rate: usize) -> DecodeResult<Waveform> {
        let values = self.read_sampled_waveform(sample_rate)?;
        // A checked waveform always carries its header.
        Ok(Waveform::from_values(values).unwrap_or_default())
    }

    pub fn read_string(&mut self, l: usize) -> DecodeResult<String> {
        self.need("string", l as u64)?;
        self.check_ascii(l)?;
        Ok(self.inner.read_string(l).unwrap_or_default())
    }

    pub fn read_formatted_string(&mut self) -> DecodeResult<String> {
        let l = self.prefixed("formatted string", 1)?;
        self.read_string(l as usize)
    }

    /// Everything left. An exhausted cursor yields an empty string, as in
    /// the lenient API.
    pub fn read_string_to_end(&mut self) -> DecodeResult<String> {
        let l = self.inner.remaining();
        self.read_string(l)
    }

    /// Skip exactly `l` bytes; unlike the lenient `ignore`, running past the
    /// end is an error and nothing is skipped.
    pub fn skip(&mut self, l: usize) -> DecodeResult<()> {
        self.need("skip", l as u64)?;
        self.inner.ignore(l);
        Ok(())
    }
}
