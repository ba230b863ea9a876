/// Width of the unsigned length prefix in front of every variable-size field.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Width of one encoded IEEE-754 binary64 value.
pub const DOUBLE_SIZE: usize = 8;

/// A complex number is two consecutive doubles: real, then imaginary.
pub const COMPLEX_SIZE: usize = 2 * DOUBLE_SIZE;

/// Number of leading waveform elements reserved for `(t0, delta_t)`.
/// These are counted by the length prefix but never decimated.
pub const WAVEFORM_HEADER_LEN: usize = 2;

/// Byte value that decodes to `true`. Anything else decodes to `false`.
pub const BOOLEAN_TRUE: u8 = 1;

// ── Complex ────────────────────────────────────────────────────────────────

/// A decoded `real + imag·i` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// The two-element `[re, im]` collection form.
    pub fn to_vec(self) -> Vec<f64> {
        vec![self.re, self.im]
    }
}

// ── Waveform ───────────────────────────────────────────────────────────────

/// Typed view over a decoded waveform collection `[t0, delta_t, s0, s1, ...]`.
///
/// `delta_t` is the value carried on the wire. When the samples were
/// decimated, the spacing between consecutive entries of `samples` is
/// `delta_t * sample_rate`; see [`Waveform::sample_spacing`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waveform {
    pub t0: f64,
    pub delta_t: f64,
    pub samples: Vec<f64>,
}

impl Waveform {
    /// Split a decoded collection into header and samples.
    ///
    /// Returns `None` when the collection is too short to carry the header,
    /// which is how an empty (guard-failed) read surfaces.
    pub fn from_values(values: Vec<f64>) -> Option<Self> {
        if values.len() < WAVEFORM_HEADER_LEN {
            return None;
        }
        let mut values = values;
        let samples = values.split_off(WAVEFORM_HEADER_LEN);
        Some(Self {
            t0: values[0],
            delta_t: values[1],
            samples,
        })
    }

    /// Time between two consecutive kept samples.
    pub fn sample_spacing(&self, sample_rate: usize) -> f64 {
        self.delta_t * sample_rate.max(1) as f64
    }

    /// `(time, value)` pairs for the kept samples.
    pub fn points(&self, sample_rate: usize) -> impl Iterator<Item = (f64, f64)> + '_ {
        let step = self.sample_spacing(sample_rate);
        self.samples
            .iter()
            .enumerate()
            .map(move |(i, &v)| (self.t0 + step * i as f64, v))
    }

    /// Flatten back into the `[t0, delta_t, samples...]` collection form.
    pub fn into_values(self) -> Vec<f64> {
        let mut out = Vec::with_capacity(WAVEFORM_HEADER_LEN + self.samples.len());
        out.push(self.t0);
        out.push(self.delta_t);
        out.extend(self.samples);
        out
    }
}

// ── Diagnostics ────────────────────────────────────────────────────────────

/// Render bytes as upper-case, space separated, two-digit hex.
///
/// ```
/// use wavebuf_core::format::hex_string;
///
/// assert_eq!(hex_string(&[0x00, 0x01, 0x0a, 0xff]), "00 01 0A FF");
/// assert_eq!(hex_string(&[]), "");
/// ```
pub fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{:02X}", b));
    }
    out
}
