//! Input cursor with strict/relaxed position tracking.

use crate::BufferError;

/// Cursor state returned by [`InputStream::save`] and consumed by
/// [`InputStream::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedPosition {
    pos: u32,
    known_pos: bool,
}

/// A cursor over an immutable byte slice.
///
/// Every read is bounds-checked against the current end, which starts at the
/// end of the slice and can be narrowed with [`InputStream::limit`].
///
/// The stream also tracks whether the next read location is fully determined
/// by the format (`known_pos`). While it is, [`InputStream::set_position`]
/// only accepts the current position. Once the caller has skipped data of
/// unknown length it calls [`InputStream::set_unknown_pos`] and later jumps
/// only have to move forward.
///
/// # Example
///
/// ```
/// use fracpack_buffers::InputStream;
///
/// let data = [0x0a, 0x00, 0x00, 0x00, 0x07];
/// let mut input = InputStream::new(&data);
///
/// assert_eq!(input.read_u32().unwrap(), 10);
/// assert_eq!(input.read_u8().unwrap(), 7);
/// assert!(input.read_u8().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct InputStream<'a> {
    /// The underlying byte slice.
    pub data: &'a [u8],
    pos: u32,
    end: u32,
    known_pos: bool,
}

impl<'a> InputStream<'a> {
    /// Creates a new stream positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        let end = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self {
            data,
            pos: 0,
            end,
            known_pos: true,
        }
    }

    /// Returns the current read position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Returns the current (possibly narrowed) end position.
    #[inline]
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Returns the number of bytes left before the end.
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.end - self.pos
    }

    /// Whether the next read location is still fully determined.
    #[inline]
    pub fn known_pos(&self) -> bool {
        self.known_pos
    }

    /// Relaxes position checks: from now on [`InputStream::set_position`]
    /// only requires the target to be at or after the cursor.
    pub fn set_unknown_pos(&mut self) {
        self.known_pos = false;
    }

    /// Sets the position tracking mode explicitly.
    pub fn set_known_pos(&mut self, known: bool) {
        self.known_pos = known;
    }

    fn check(&self, size: u32) -> Result<(), BufferError> {
        if size > self.end - self.pos {
            Err(BufferError::OutOfBounds)
        } else {
            Ok(())
        }
    }

    /// Reads `size` bytes and advances the cursor.
    pub fn read_bytes(&mut self, size: u32) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let start = self.pos as usize;
        self.pos += size;
        Ok(&self.data[start..self.pos as usize])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(self.read_bytes(N as u32)?);
        Ok(bytes)
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8, BufferError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Reads an unsigned 16-bit integer (little-endian).
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16, BufferError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    /// Reads an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32, BufferError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Reads an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64, BufferError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Reads a 32-bit float (little-endian).
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32, BufferError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Reads a 64-bit float (little-endian).
    #[inline]
    pub fn read_f64(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_le_bytes(self.read_array()?))
    }

    /// Reads a little-endian u32 at an absolute position without moving the
    /// cursor.
    pub fn read_u32_at(&self, pos: u32) -> Result<u32, BufferError> {
        let start = pos as usize;
        if pos > self.end || self.end - pos < 4 {
            return Err(BufferError::OutOfBounds);
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.data[start..start + 4]);
        Ok(u32::from_le_bytes(bytes))
    }

    /// Advances the cursor over `size` bytes whose location the format
    /// already determines (e.g. an aggregate's inline region).
    pub fn advance(&mut self, size: u32) -> Result<(), BufferError> {
        self.check(size)?;
        self.pos += size;
        Ok(())
    }

    /// Moves the cursor to `pos`, enforcing the position contract.
    ///
    /// With known positions `pos` must equal the cursor; otherwise it must
    /// not be behind it. Either way it must lie within the stream.
    pub fn set_position(&mut self, pos: u32) -> Result<(), BufferError> {
        if pos > self.end {
            return Err(BufferError::OutOfBounds);
        }
        if self.known_pos {
            if pos != self.pos {
                return Err(BufferError::BadOffset);
            }
        } else if pos < self.pos {
            return Err(BufferError::BadOffset);
        }
        self.pos = pos;
        Ok(())
    }

    /// Moves the cursor to `pos` unconditionally (within bounds).
    pub fn seek(&mut self, pos: u32) -> Result<(), BufferError> {
        if pos > self.end {
            return Err(BufferError::OutOfBounds);
        }
        self.pos = pos;
        Ok(())
    }

    /// Enters `pos` with known positions, returning the state to hand back
    /// to [`InputStream::restore`].
    pub fn save(&mut self, pos: u32) -> Result<SavedPosition, BufferError> {
        if pos > self.end {
            return Err(BufferError::OutOfBounds);
        }
        let saved = SavedPosition {
            pos: self.pos,
            known_pos: self.known_pos,
        };
        self.pos = pos;
        self.known_pos = true;
        Ok(saved)
    }

    /// Returns to a state captured by [`InputStream::save`].
    pub fn restore(&mut self, saved: SavedPosition) {
        self.pos = saved.pos;
        self.known_pos = saved.known_pos;
    }

    /// Runs `f` at `pos` and restores the cursor afterwards, whether `f`
    /// succeeds or not.
    pub fn scoped<T, E, F>(&mut self, pos: u32, f: F) -> Result<T, E>
    where
        E: From<BufferError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let saved = self.save(pos)?;
        let result = f(self);
        self.restore(saved);
        result
    }

    /// Narrows the readable window to end at `end`, returning the previous
    /// end for [`InputStream::unlimit`].
    pub fn limit(&mut self, end: u32) -> Result<u32, BufferError> {
        if end < self.pos || end > self.end {
            return Err(BufferError::OutOfBounds);
        }
        let prev = self.end;
        self.end = end;
        Ok(prev)
    }

    /// Restores an end previously returned by [`InputStream::limit`].
    pub fn unlimit(&mut self, end: u32) {
        self.end = end;
    }
}
