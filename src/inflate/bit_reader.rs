//! Bit-level reader for DEFLATE streams.
//!
//! DEFLATE packs data elements starting at the least-significant bit of each
//! byte. Multi-bit fields (header fields, extra bits) are assembled with the
//! first bit read as the least-significant bit of the value.

use crate::error::{Error, Result};

/// Maximum width of a single `read_bits` call.
pub const MAX_READ_BITS: u8 = 16;

/// LSB-first bit reader over a borrowed byte slice.
///
/// The cursor is `(byte_pos, bit_pos)` with `bit_pos` in `0..8`. Only bit and
/// byte reads move it.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader positioned at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// Read one bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<u32> {
        let byte = *self
            .data
            .get(self.byte_pos)
            .ok_or(Error::UnexpectedEndOfInput)?;
        let bit = (byte >> self.bit_pos) & 1;
        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
        Ok(bit as u32)
    }

    /// Read `n` bits LSB-first (`n <= 16`).
    ///
    /// Fails without moving the cursor if fewer than `n` bits remain.
    #[inline]
    pub fn read_bits(&mut self, n: u8) -> Result<u32> {
        debug_assert!(n <= MAX_READ_BITS);
        if n == 0 {
            return Ok(0);
        }
        if self.bits_remaining() < n as usize {
            return Err(Error::UnexpectedEndOfInput);
        }

        let mut value = 0u32;
        let mut filled = 0u8;
        while filled < n {
            let available = 8 - self.bit_pos;
            let take = available.min(n - filled);
            let byte = self.data[self.byte_pos] as u32;
            let bits = (byte >> self.bit_pos) & ((1 << take) - 1);
            value |= bits << filled;
            filled += take;
            self.bit_pos += take;
            if self.bit_pos == 8 {
                self.bit_pos = 0;
                self.byte_pos += 1;
            }
        }
        Ok(value)
    }

    /// Discard the rest of a partially consumed byte.
    pub fn align_to_byte(&mut self) {
        if self.bit_pos != 0 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
    }

    /// Borrow the next `len` whole bytes and advance past them.
    ///
    /// The reader must be byte-aligned (stored block payloads are).
    pub fn read_aligned_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        debug_assert!(self.is_aligned());
        let end = self
            .byte_pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEndOfInput)?;
        let bytes = &self.data[self.byte_pos..end];
        self.byte_pos = end;
        Ok(bytes)
    }

    /// Read a little-endian u16 from the next two aligned bytes.
    pub fn read_u16_le(&mut self) -> Result<u16> {
        let bytes = self.read_aligned_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Whether the cursor sits on a byte boundary.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Index of the byte holding the next bit.
    #[inline]
    pub fn byte_position(&self) -> usize {
        self.byte_pos
    }

    /// Offset of the next bit within the current byte.
    #[inline]
    pub fn bit_position(&self) -> u8 {
        self.bit_pos
    }

    #[inline]
    fn bits_remaining(&self) -> usize {
        (self.data.len() - self.byte_pos.min(self.data.len())) * 8 - self.bit_pos as usize
    }
}
