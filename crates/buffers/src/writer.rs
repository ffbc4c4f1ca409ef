//! Append-only byte buffer with auto-growing capacity and in-place patching.

/// A binary buffer writer that grows automatically as needed.
///
/// Bytes before the cursor `x` are the written data; everything from `x` to
/// the end of `uint8` is spare capacity. Besides appending, already written
/// bytes can be patched in place or removed, which is what a deferred-layout
/// encoder needs when it finalizes a container header.
///
/// # Example
///
/// ```
/// use velocypack_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.u8(0x01);
/// writer.uint_le(0x0302, 2);
/// assert_eq!(writer.flush(), [0x01, 0x02, 0x03]);
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub uint8: Vec<u8>,
    /// Current cursor position (number of written bytes).
    pub x: usize,
    /// Allocation size when buffer needs to grow.
    alloc_size: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates a new writer with default allocation size (1KB).
    pub fn new() -> Self {
        Self::with_alloc_size(1024)
    }

    /// Creates a new writer with custom allocation size.
    pub fn with_alloc_size(alloc_size: usize) -> Self {
        let alloc_size = alloc_size.max(16);
        Self {
            uint8: vec![0u8; alloc_size],
            x: 0,
            alloc_size,
        }
    }

    /// Ensures the buffer has at least `capacity` bytes available past the cursor.
    pub fn ensure_capacity(&mut self, capacity: usize) {
        let remaining = self.uint8.len() - self.x;
        if remaining < capacity {
            let required = self.x + capacity;
            let new_size = if required <= self.alloc_size {
                self.alloc_size
            } else {
                required * 2
            };
            self.grow(new_size);
        }
    }

    fn grow(&mut self, new_size: usize) {
        self.uint8.resize(new_size, 0);
    }

    /// Number of written bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.x
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x == 0
    }

    /// The written bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.uint8[..self.x]
    }

    /// Returns a copy of the written data and resets the cursor.
    pub fn flush(&mut self) -> Vec<u8> {
        let result = self.uint8[..self.x].to_vec();
        self.x = 0;
        result
    }

    /// Consumes the writer, returning exactly the written bytes.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.uint8.truncate(self.x);
        self.uint8
    }

    /// Drops everything written after `len`.
    pub fn truncate(&mut self, len: usize) {
        if len < self.x {
            self.x = len;
        }
    }

    /// Writes an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.ensure_capacity(1);
        self.uint8[self.x] = val;
        self.x += 1;
    }

    /// Writes the low `width` bytes of `val` (little-endian).
    #[inline]
    pub fn uint_le(&mut self, val: u64, width: usize) {
        debug_assert!(width <= 8);
        self.ensure_capacity(width);
        let bytes = val.to_le_bytes();
        self.uint8[self.x..self.x + width].copy_from_slice(&bytes[..width]);
        self.x += width;
    }

    /// Writes a 64-bit floating point number as its little-endian bit pattern.
    #[inline]
    pub fn f64_le(&mut self, val: f64) {
        self.uint_le(val.to_bits(), 8);
    }

    /// Appends `count` zero bytes.
    pub fn zeros(&mut self, count: usize) {
        self.ensure_capacity(count);
        self.uint8[self.x..self.x + count].fill(0);
        self.x += count;
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        let length = buf.len();
        self.ensure_capacity(length);
        self.uint8[self.x..self.x + length].copy_from_slice(buf);
        self.x += length;
    }

    /// Writes a UTF-8 string. Returns the number of bytes written.
    pub fn utf8(&mut self, s: &str) -> usize {
        let bytes = s.as_bytes();
        self.buf(bytes);
        bytes.len()
    }

    /// Appends `value` as unsigned LEB128.
    pub fn varlen(&mut self, value: u64) {
        let mut val = value;
        while val >= 0x80 {
            self.u8((val & 0x7f) as u8 | 0x80);
            val >>= 7;
        }
        self.u8((val & 0x7f) as u8);
    }

    /// Overwrites a previously written byte.
    #[inline]
    pub fn set_u8(&mut self, pos: usize, val: u8) {
        self.uint8[pos] = val;
    }

    /// Overwrites `width` previously written bytes at `pos` with `val` (little-endian).
    pub fn set_uint_le(&mut self, pos: usize, val: u64, width: usize) {
        let bytes = val.to_le_bytes();
        self.uint8[pos..pos + width].copy_from_slice(&bytes[..width]);
    }

    /// Stores `value` as LEB128 starting at `pos`, growing toward higher
    /// addresses. Returns the number of bytes written.
    pub fn set_varlen(&mut self, pos: usize, value: u64) -> usize {
        let mut i = pos;
        let mut val = value;
        while val >= 0x80 {
            self.uint8[i] = (val & 0x7f) as u8 | 0x80;
            val >>= 7;
            i += 1;
        }
        self.uint8[i] = (val & 0x7f) as u8;
        i + 1 - pos
    }

    /// Stores `value` as LEB128 ending just before `end`, growing toward lower
    /// addresses: the least significant group lands at `end - 1`.
    pub fn set_varlen_reversed(&mut self, end: usize, value: u64) -> usize {
        let mut i = end;
        let mut val = value;
        while val >= 0x80 {
            i -= 1;
            self.uint8[i] = (val & 0x7f) as u8 | 0x80;
            val >>= 7;
        }
        i -= 1;
        self.uint8[i] = (val & 0x7f) as u8;
        end - i
    }

    /// Removes `count` written bytes starting at `pos`, shifting the tail down.
    pub fn remove(&mut self, pos: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.uint8.copy_within(pos + count..self.x, pos);
        self.x -= count;
    }
}
