//! Byte stream codecs for fracpack.
//!
//! # Overview
//!
//! - [`OutputStream`] - append-only little-endian buffer with offset backpatching
//! - [`InputStream`] - bounds-checked cursor with strict/relaxed position tracking
//!
//! # Example
//!
//! ```
//! use fracpack_buffers::{InputStream, OutputStream};
//!
//! let mut out = OutputStream::new();
//! out.write_u8(0x01);
//! out.write_u16(0x0203);
//! out.write_bytes(b"hello");
//! let data = out.finish();
//!
//! let mut input = InputStream::new(&data);
//! assert_eq!(input.read_u8().unwrap(), 0x01);
//! assert_eq!(input.read_u16().unwrap(), 0x0203);
//! assert_eq!(input.read_bytes(5).unwrap(), b"hello");
//! ```

mod reader;
mod writer;

pub use reader::{InputStream, SavedPosition};
pub use writer::OutputStream;

/// Error type for stream operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    OutOfBounds,
    /// A jump violated the position contract.
    BadOffset,
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::OutOfBounds => write!(f, "read past end of buffer"),
            BufferError::BadOffset => write!(f, "bad offset"),
        }
    }
}

impl std::error::Error for BufferError {}
