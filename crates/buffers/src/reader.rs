//! Bounds-checked little-endian reader over a borrowed byte slice.

use std::str;

use crate::BufferError;

/// A binary buffer reader that reads data from a byte slice.
///
/// The reader keeps a cursor `x` which every `try_*` call advances. Reads
/// never panic: running past the end of `uint8` yields
/// [`BufferError::EndOfBuffer`].
///
/// # Example
///
/// ```
/// use velocypack_buffers::Reader;
///
/// let data = [0x01, 0x02, 0x03, 0x04];
/// let mut reader = Reader::new(&data);
///
/// assert_eq!(reader.try_u8().unwrap(), 0x01);
/// assert_eq!(reader.try_uint_le(2).unwrap(), 0x0302);
/// ```
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub uint8: &'a [u8],
    /// Current cursor position.
    pub x: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader positioned at the start of `uint8`.
    pub fn new(uint8: &'a [u8]) -> Self {
        Self { uint8, x: 0 }
    }

    /// Creates a reader positioned at `x`.
    pub fn at(uint8: &'a [u8], x: usize) -> Self {
        Self { uint8, x }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.uint8.len().saturating_sub(self.x)
    }

    /// Checks that `n` more bytes are available from the current cursor.
    #[inline]
    fn check(&self, n: usize) -> Result<(), BufferError> {
        match self.x.checked_add(n) {
            Some(end) if end <= self.uint8.len() => Ok(()),
            _ => Err(BufferError::EndOfBuffer),
        }
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn try_u8(&mut self) -> Result<u8, BufferError> {
        self.check(1)?;
        let val = self.uint8[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads an unsigned little-endian integer of `width` bytes (1..=8).
    #[inline]
    pub fn try_uint_le(&mut self, width: usize) -> Result<u64, BufferError> {
        debug_assert!(width <= 8);
        self.check(width)?;
        let mut bytes = [0u8; 8];
        bytes[..width].copy_from_slice(&self.uint8[self.x..self.x + width]);
        self.x += width;
        Ok(u64::from_le_bytes(bytes))
    }

    /// Reads a two's complement little-endian integer of `width` bytes
    /// (1..=8), sign-extending from its highest byte.
    pub fn try_int_le(&mut self, width: usize) -> Result<i64, BufferError> {
        let raw = self.try_uint_le(width)?;
        if width == 0 || width >= 8 {
            return Ok(raw as i64);
        }
        let shift = 64 - 8 * width as u32;
        Ok(((raw << shift) as i64) >> shift)
    }

    /// Reads a 64-bit float from its little-endian bit pattern.
    pub fn try_f64_le(&mut self) -> Result<f64, BufferError> {
        Ok(f64::from_bits(self.try_uint_le(8)?))
    }

    /// Reads `size` raw bytes and advances the cursor.
    pub fn try_buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let x = self.x;
        let end = x + size;
        let bin = &self.uint8[x..end];
        self.x = end;
        Ok(bin)
    }

    /// Reads a UTF-8 string of `size` bytes.
    pub fn try_utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        self.check(size)?;
        let start = self.x;
        self.x += size;
        str::from_utf8(&self.uint8[start..self.x]).map_err(|_| BufferError::InvalidUtf8)
    }

    /// Reads an unsigned LEB128 integer going forward.
    pub fn try_varlen(&mut self) -> Result<u64, BufferError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.try_u8()?;
            if shift >= 64 || (shift == 63 && byte & 0x7e != 0) {
                return Err(BufferError::VarlenOverflow);
            }
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Reads an unsigned LEB128 integer stored backwards: the least
    /// significant group sits at `x - 1` and more groups follow toward lower
    /// addresses. On return `x` points at the first byte of the encoding.
    pub fn try_varlen_reversed(&mut self) -> Result<u64, BufferError> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            if self.x == 0 || self.x > self.uint8.len() {
                return Err(BufferError::EndOfBuffer);
            }
            self.x -= 1;
            let byte = self.uint8[self.x];
            if shift >= 64 || (shift == 63 && byte & 0x7e != 0) {
                return Err(BufferError::VarlenOverflow);
            }
            value |= ((byte & 0x7f) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }
}
