//! Byte buffer primitives shared by the velocypack encoder and decoder.
//!
//! All multi-byte integers are little-endian. Variable-length integers use
//! unsigned LEB128 (7 bits per byte, high bit set on every byte but the last)
//! and can be stored or read in either direction.

mod reader;
mod varlen;
mod writer;

pub use reader::Reader;
pub use varlen::varlen_size;
pub use writer::Writer;

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("invalid utf-8 sequence")]
    InvalidUtf8,
    #[error("variable-length integer does not fit in 64 bits")]
    VarlenOverflow,
}
