use std::ops::Range;

use byteorder::{BigEndian, ByteOrder};

use crate::{ClassFileError, Result};

/// Read-only, bounds-checked view over the bytes of a class file.
///
/// All offsets are relative to the start of the view. Multi-byte reads are
/// big-endian, as everywhere in the class file format.
#[derive(Clone, Copy)]
pub struct ByteArray<'a> {
    bytes: &'a [u8],
}
impl<'a> ByteArray<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn u1(&self, offset: usize) -> Result<u8> {
        Ok(self.range(offset, 1)?[0])
    }

    pub fn u2(&self, offset: usize) -> Result<u16> {
        Ok(BigEndian::read_u16(self.range(offset, 2)?))
    }

    pub fn u4(&self, offset: usize) -> Result<u32> {
        Ok(BigEndian::read_u32(self.range(offset, 4)?))
    }

    pub fn i4(&self, offset: usize) -> Result<i32> {
        Ok(BigEndian::read_i32(self.range(offset, 4)?))
    }

    /// Zero-copy sub-view over `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<ByteArray<'a>> {
        if start > end {
            return Err(ClassFileError::OutOfBounds {
                offset: start,
                len: 0,
            });
        }

        Ok(ByteArray::new(self.range(start, end - start)?))
    }

    pub fn bytes(&self, range: Range<usize>) -> Result<&'a [u8]> {
        Ok(self.slice(range.start, range.end)?.bytes)
    }

    fn range(&self, offset: usize, len: usize) -> Result<&'a [u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(ClassFileError::OutOfBounds { offset, len })
    }
}

impl std::fmt::Debug for ByteArray<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteArray")
            .field("bytes", &format!("({} bytes)", self.bytes.len()))
            .finish()
    }
}
