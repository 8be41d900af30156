//! Bounds-checked little-endian reader over an immutable byte slice

use bytemuck::Pod;

use crate::error::DecodeError;

/// Width of the length field in front of a length-prefixed block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixWidth {
    /// `u8` length
    One,
    /// `u16` length
    Two,
    /// `u32` length
    Four,
}

impl PrefixWidth {
    /// Size of the length field in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
        }
    }
}

/// Sequential reader that never indexes past the end of its slice
///
/// Positions are relative to the slice; errors report absolute file
/// offsets by adding the slice's base offset. Cursors borrow the buffer and
/// are cheap to copy, so independent views over one buffer need no
/// coordination.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    base: usize,
    pos: usize,
    length_limit: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor over a whole buffer
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            base: 0,
            pos: 0,
            length_limit: usize::MAX,
        }
    }

    /// Create a cursor over `buffer[offset..offset + len]`
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the range does not lie within the buffer
    pub fn scoped(buffer: &'a [u8], offset: usize, len: usize) -> Result<Self, DecodeError> {
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= buffer.len())
            .ok_or(DecodeError::OutOfBounds {
                offset,
                needed: len,
                available: buffer.len().saturating_sub(offset),
            })?;

        Ok(Self {
            bytes: &buffer[offset..end],
            base: offset,
            pos: 0,
            length_limit: usize::MAX,
        })
    }

    /// Cap the length any length-prefixed read will accept
    #[must_use]
    pub fn with_length_limit(mut self, limit: usize) -> Self {
        self.length_limit = limit;
        self
    }

    /// Current position relative to the start of this cursor
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Current position as an absolute file offset
    #[must_use]
    pub fn absolute_position(&self) -> usize {
        self.base + self.pos
    }

    /// Absolute file offset of the first byte of this cursor
    #[must_use]
    pub fn base(&self) -> usize {
        self.base
    }

    /// Total length of the underlying view
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True if the view is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes left to read
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// True once every byte has been consumed
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    /// The whole underlying view, independent of position
    #[must_use]
    pub fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }

    fn out_of_bounds(&self, needed: usize) -> DecodeError {
        DecodeError::OutOfBounds {
            offset: self.absolute_position(),
            needed,
            available: self.remaining(),
        }
    }

    /// Read exactly `n` bytes without copying
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `n` bytes remain
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(self.out_of_bounds(n));
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.bytes[start..self.pos])
    }

    /// Read a fixed-size byte array
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `N` bytes remain
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a plain-old-data value from unaligned bytes
    ///
    /// The value is copied verbatim; multi-byte fields still have to be
    /// converted from little-endian by the caller.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the value does not fit in the remaining bytes
    pub fn read_pod<T: Pod>(&mut self) -> Result<T, DecodeError> {
        let bytes = self.read_bytes(std::mem::size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }

    /// Read a `u8`
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` at end of input
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a little-endian `u16`
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than 2 bytes remain
    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        self.read_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than 4 bytes remain
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.read_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `i32`
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than 4 bytes remain
    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.read_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian IEEE 754 single
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than 4 bytes remain
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read an unsigned little-endian integer of 1 to 8 bytes
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `width` bytes remain
    ///
    /// # Panics
    ///
    /// Panics if `width` is 0 or larger than 8 (layout table bug)
    pub fn read_uint(&mut self, width: usize) -> Result<u64, DecodeError> {
        assert!((1..=8).contains(&width), "integer width must be 1..=8");
        let bytes = self.read_bytes(width)?;
        let mut buf = [0u8; 8];
        buf[..width].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Read an `n`-byte NUL-padded text field
    ///
    /// Text ends at the first NUL; invalid UTF-8 is replaced rather than
    /// rejected since replay strings carry no declared encoding.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `n` bytes remain
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String, DecodeError> {
        let bytes = self.read_bytes(n)?;
        Ok(decode_text(bytes))
    }

    /// Read a length field of the given width, then that many bytes
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if the length field itself is cut short, and
    /// `MalformedLength` if the declared length exceeds the remaining bytes
    /// or the cursor's length limit
    pub fn read_length_prefixed_bytes(
        &mut self,
        width: PrefixWidth,
    ) -> Result<&'a [u8], DecodeError> {
        let field_offset = self.absolute_position();
        let declared = match width {
            PrefixWidth::One => usize::from(self.read_u8()?),
            PrefixWidth::Two => usize::from(self.read_u16()?),
            PrefixWidth::Four => self.read_u32()? as usize,
        };

        let allowed = self.remaining().min(self.length_limit);
        if declared > allowed {
            return Err(DecodeError::MalformedLength {
                offset: field_offset,
                declared,
                available: allowed,
            });
        }

        self.read_bytes(declared)
    }

    /// Read a length-prefixed text field, cut at the first NUL
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_length_prefixed_bytes`]
    pub fn read_length_prefixed_string(
        &mut self,
        width: PrefixWidth,
    ) -> Result<String, DecodeError> {
        self.read_length_prefixed_bytes(width).map(decode_text)
    }

    /// Move to `offset`, relative to the start of this cursor
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if `offset` is past the end
    pub fn seek_absolute(&mut self, offset: usize) -> Result<(), DecodeError> {
        if offset > self.bytes.len() {
            return Err(DecodeError::OutOfBounds {
                offset: self.base + offset,
                needed: 0,
                available: 0,
            });
        }
        self.pos = offset;
        Ok(())
    }

    /// Advance by `n` bytes without reading them
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `n` bytes remain
    pub fn skip(&mut self, n: usize) -> Result<(), DecodeError> {
        self.read_bytes(n).map(|_| ())
    }

    /// Split off the next `n` bytes as an independent cursor
    ///
    /// The parent advances past them. The child keeps absolute offsets and
    /// the parent's length limit.
    ///
    /// # Errors
    ///
    /// Returns `OutOfBounds` if fewer than `n` bytes remain
    pub fn sub_cursor(&mut self, n: usize) -> Result<ByteCursor<'a>, DecodeError> {
        let base = self.absolute_position();
        let bytes = self.read_bytes(n)?;
        Ok(Self {
            bytes,
            base,
            pos: 0,
            length_limit: self.length_limit,
        })
    }

    /// Consume and return everything left
    pub fn read_rest(&mut self) -> &'a [u8] {
        let start = self.pos;
        self.pos = self.bytes.len();
        &self.bytes[start..]
    }
}

fn decode_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
