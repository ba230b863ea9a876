use thiserror::Error;

/// Failures reported by [`crate::strict::StrictReader`].
///
/// The lenient [`crate::ReadableCursor`] API never produces these; it degrades
/// to default values instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("short read for {field} at offset {offset}: need {needed} bytes, {remaining} remaining")]
    ShortRead {
        field: &'static str,
        offset: usize,
        needed: u64,
        remaining: usize,
    },
    #[error("sample rate must be at least 1")]
    InvalidSampleRate,
    #[error("non-ASCII byte 0x{byte:02X} at offset {offset}")]
    NonAscii { byte: u8, offset: usize },
}

pub type DecodeResult<T> = Result<T, DecodeError>;
