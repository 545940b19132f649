//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// Maximum number of 7-bit groups in a `u64` varint.
const MAX_VARINT_GROUPS: usize = 10;

/// A bit-level reader for decoding packed binary data.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Reads a single bit as a boolean.
    pub fn read_bool(&mut self) -> BitResult<bool> {
        self.ensure_bits(1)?;
        let byte_idx = self.bit_pos / 8;
        let bit_idx = self.bit_pos % 8;
        let bit = (self.data[byte_idx] >> (7 - bit_idx)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as an unsigned integer.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(0);
        }
        self.ensure_bits(usize::from(bits))?;

        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.read_bool()?);
        }
        Ok(value)
    }

    /// Reads an 8-bit `u8`.
    pub fn read_u8(&mut self) -> BitResult<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads a 16-bit `u16`.
    pub fn read_u16(&mut self) -> BitResult<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    /// Reads a 32-bit `u32`.
    pub fn read_u32(&mut self) -> BitResult<u32> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Reads a 64-bit `u64`.
    pub fn read_u64(&mut self) -> BitResult<u64> {
        self.read_bits(64)
    }

    /// Reads a two's complement `i32`.
    pub fn read_i32(&mut self) -> BitResult<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads a two's complement `i64`.
    pub fn read_i64(&mut self) -> BitResult<i64> {
        Ok(self.read_u64()? as i64)
    }

    /// Reads an `f32` from its IEEE-754 bit pattern.
    pub fn read_f32(&mut self) -> BitResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads an `f64` from its IEEE-754 bit pattern.
    pub fn read_f64(&mut self) -> BitResult<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Reads a varint `u32` written by [`BitWriter::write_varu32`](crate::BitWriter::write_varu32).
    pub fn read_varu32(&mut self) -> BitResult<u32> {
        let value = self.read_varu64()?;
        u32::try_from(value).map_err(|_| BitError::InvalidVarint)
    }

    /// Reads a varint `u64`.
    pub fn read_varu64(&mut self) -> BitResult<u64> {
        let mut value = 0u64;
        for group in 0..MAX_VARINT_GROUPS {
            let more = self.read_bool()?;
            let bits = self.read_bits(7)?;
            let shift = group * 7;
            if shift >= 64 || (shift > 57 && bits >> (64 - shift) != 0) {
                return Err(BitError::InvalidVarint);
            }
            value |= bits << shift;
            if !more {
                return Ok(value);
            }
        }
        Err(BitError::InvalidVarint)
    }

    /// Reads a length-prefixed byte vector, rejecting lengths above `max_len`.
    pub fn read_bytes(&mut self, max_len: usize) -> BitResult<Vec<u8>> {
        let len = self.read_varu32()? as usize;
        if len > max_len {
            return Err(BitError::LengthLimit {
                length: len,
                limit: max_len,
            });
        }
        self.ensure_bits(len.saturating_mul(8))?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_u8()?);
        }
        Ok(out)
    }

    /// Reads a length-prefixed UTF-8 string, rejecting lengths above `max_len`.
    pub fn read_string(&mut self, max_len: usize) -> BitResult<String> {
        let bytes = self.read_bytes(max_len)?;
        String::from_utf8(bytes).map_err(|_| BitError::InvalidUtf8)
    }

    /// Skips padding up to the next byte boundary.
    pub fn align_to_byte(&mut self) -> BitResult<()> {
        let rem = self.bit_pos % 8;
        if rem == 0 {
            return Ok(());
        }
        let skip = 8 - rem;
        self.ensure_bits(skip)?;
        self.bit_pos += skip;
        Ok(())
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available,
            });
        }
        Ok(())
    }
}
