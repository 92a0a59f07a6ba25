//! Bounds-checked little-endian reader over a byte slice.

use crate::error::{DecodeError, DecodeResult};

/// Reads fixed-width little-endian values, advancing an internal offset.
///
/// Every read is checked against the buffer length; a short buffer yields
/// [`DecodeError::BufferUnderrun`] and leaves the offset unchanged.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Start reading at `offset`. Positions past the end are allowed; the
    /// first read will fail.
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn can_read(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    pub fn read_bytes(&mut self, n: usize) -> DecodeResult<&'a [u8]> {
        if !self.can_read(n) {
            return Err(DecodeError::BufferUnderrun {
                offset: self.offset,
                requested: n,
                len: self.data.len(),
            });
        }
        let slice = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> DecodeResult<()> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> DecodeResult<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> DecodeResult<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Low half first, then high half, combined in a `u64`.
    pub fn read_u64_le(&mut self) -> DecodeResult<u64> {
        if !self.can_read(8) {
            return Err(DecodeError::BufferUnderrun {
                offset: self.offset,
                requested: 8,
                len: self.data.len(),
            });
        }
        let low = self.read_u32_le()? as u64;
        let high = self.read_u32_le()? as u64;
        Ok((high << 32) | low)
    }
}
