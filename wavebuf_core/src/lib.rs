pub mod buffer;
pub mod codec;
pub mod error;
pub mod format;
pub mod reader;
pub mod strict;
pub mod writer;

pub use buffer::ByteBuffer;
pub use error::{DecodeError, DecodeResult};
pub use format::{Complex, Waveform};
pub use reader::ReadableCursor;
pub use strict::StrictReader;
pub use writer::AppendableSink;
