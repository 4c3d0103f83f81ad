//! Append-only output buffer with backpatchable offsets.

/// An append-only little-endian byte buffer.
///
/// Bytes only ever get appended, except through [`OutputStream::patch_u32`],
/// which rewrites four bytes that were written earlier (an offset
/// placeholder) without changing the length.
///
/// # Example
///
/// ```
/// use fracpack_buffers::OutputStream;
///
/// let mut out = OutputStream::new();
/// let slot = out.position();
/// out.write_u32(0);
/// out.write_u8(0xff);
/// out.patch_u32(slot, 4);
/// assert_eq!(out.finish(), vec![0x04, 0x00, 0x00, 0x00, 0xff]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutputStream {
    /// The bytes written so far.
    pub data: Vec<u8>,
}

impl OutputStream {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty stream with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Returns the position the next byte will be written at.
    #[inline]
    pub fn position(&self) -> u32 {
        self.data.len() as u32
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    /// Writes an unsigned 16-bit integer (little-endian).
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn write_u64(&mut self, value: u64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a 32-bit float (little-endian).
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes a 64-bit float (little-endian).
    #[inline]
    pub fn write_f64(&mut self, value: f64) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Writes raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Overwrites four already-written bytes at `pos` with `value`.
    ///
    /// # Panics
    ///
    /// Panics if `pos + 4` is past the end of the written data.
    pub fn patch_u32(&mut self, pos: u32, value: u32) {
        let pos = pos as usize;
        self.data[pos..pos + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Returns the written bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Discards everything written so far.
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Consumes the stream and returns the written bytes.
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}
