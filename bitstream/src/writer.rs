//! Bit-level writer for encoding packed binary data.

use crate::error::{BitError, BitResult};

/// A bit-level writer for encoding packed binary data.
///
/// Writes are accumulated in an internal buffer. Call [`finish`](Self::finish)
/// to get the final byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Writes a single bit.
    pub fn write_bool(&mut self, value: bool) {
        self.current_byte = (self.current_byte << 1) | u8::from(value);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes up to 64 bits from an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }

        if self.bit_count == 0 && bits % 8 == 0 {
            let bytes = value.to_be_bytes();
            let start = 8 - usize::from(bits / 8);
            self.bytes.extend_from_slice(&bytes[start..]);
            return Ok(());
        }
        for i in (0..bits).rev() {
            self.write_bool((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Writes a `u8` as 8 bits.
    pub fn write_u8(&mut self, value: u8) {
        self.write_fixed(u64::from(value), 8);
    }

    /// Writes a `u16` as 16 bits.
    pub fn write_u16(&mut self, value: u16) {
        self.write_fixed(u64::from(value), 16);
    }

    /// Writes a `u32` as 32 bits.
    pub fn write_u32(&mut self, value: u32) {
        self.write_fixed(u64::from(value), 32);
    }

    /// Writes a `u64` as 64 bits.
    pub fn write_u64(&mut self, value: u64) {
        self.write_fixed(value, 64);
    }

    /// Writes an `i32` in two's complement.
    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    /// Writes an `i64` in two's complement.
    pub fn write_i64(&mut self, value: i64) {
        self.write_u64(value as u64);
    }

    /// Writes an `f32` by its IEEE-754 bit pattern.
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes an `f64` by its IEEE-754 bit pattern.
    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    /// Writes a varint `u32` in 7-bit groups (not byte aligned).
    pub fn write_varu32(&mut self, value: u32) {
        self.write_varu64(u64::from(value));
    }

    /// Writes a varint `u64` in 7-bit groups (not byte aligned).
    pub fn write_varu64(&mut self, mut value: u64) {
        loop {
            let group = value & 0x7F;
            value >>= 7;
            let more = value != 0;
            self.write_bool(more);
            self.write_fixed(group, 7);
            if !more {
                break;
            }
        }
    }

    /// Writes a varint-length-prefixed byte slice.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> BitResult<()> {
        let len = u32::try_from(bytes.len()).map_err(|_| BitError::LengthLimit {
            length: bytes.len(),
            limit: u32::MAX as usize,
        })?;
        self.write_varu32(len);
        for byte in bytes {
            self.write_u8(*byte);
        }
        Ok(())
    }

    /// Writes a varint-length-prefixed UTF-8 string.
    pub fn write_str(&mut self, value: &str) -> BitResult<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        while self.bit_count != 0 {
            self.write_bool(false);
        }
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.bytes.push(self.current_byte);
        }
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    pub fn finish_into(self, buf: &mut Vec<u8>) {
        let mut bytes = self.finish();
        buf.append(&mut bytes);
    }

    fn write_fixed(&mut self, value: u64, bits: u8) {
        // Callers pass widths <= 64 with values that fit.
        if let Err(err) = self.write_bits(value, bits) {
            debug_assert!(false, "fixed-width write rejected: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_writer() {
        let writer = BitWriter::new();
        assert_eq!(writer.bits_written(), 0);
        let bytes = writer.finish();
        assert!(bytes.is_empty());
    }

    #[test]
    fn write_single_bit_true() {
        let mut writer = BitWriter::new();
        writer.write_bool(true);
        assert_eq!(writer.bits_written(), 1);
        let bytes = writer.finish();
        // Single bit 1, padded with 7 zeros = 0b1000_0000
        assert_eq!(bytes, vec![0b1000_0000]);
    }

    #[test]
    fn write_partial_byte_with_padding() {
        let mut writer = BitWriter::new();
        writer.write_bool(true);
        writer.write_bool(true);
        writer.write_bool(false);
        writer.write_bool(true);
        writer.write_bool(false);
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0b1101_0000]);
    }

    #[test]
    fn write_bits_across_byte_boundary() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b1111, 4).unwrap();
        writer.write_bits(0b1010_1010, 8).unwrap();
        let bytes = writer.finish();
        // 1111 + 10101010 = 1111_1010 1010_0000
        assert_eq!(bytes, vec![0b1111_1010, 0b1010_0000]);
    }

    #[test]
    fn write_bits_aligned_fast_path_is_big_endian() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xABCD, 16).unwrap();
        assert_eq!(writer.finish(), vec![0xAB, 0xCD]);
    }

    #[test]
    fn write_bits_invalid_count() {
        let mut writer = BitWriter::new();
        let result = writer.write_bits(0, 65);
        assert!(matches!(
            result,
            Err(BitError::InvalidBitCount {
                bits: 65,
                max_bits: 64
            })
        ));
    }

    #[test]
    fn write_bits_value_out_of_range() {
        let mut writer = BitWriter::new();
        let result = writer.write_bits(256, 8);
        assert!(matches!(
            result,
            Err(BitError::ValueOutOfRange {
                value: 256,
                bits: 8
            })
        ));
    }

    #[test]
    fn write_bits_64_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(u64::MAX, 64).unwrap();
        let bytes = writer.finish();
        assert_eq!(bytes, vec![0xFF; 8]);
    }

    #[test]
    fn varint_small_value_is_one_group() {
        let mut writer = BitWriter::new();
        writer.write_varu32(5);
        assert_eq!(writer.bits_written(), 8);
    }

    #[test]
    fn varint_large_value_uses_more_groups() {
        let mut writer = BitWriter::new();
        writer.write_varu32(300);
        assert_eq!(writer.bits_written(), 16);
    }

    #[test]
    fn align_pads_to_boundary() {
        let mut writer = BitWriter::new();
        writer.write_bool(true);
        writer.align_to_byte();
        assert_eq!(writer.bits_written(), 8);
        writer.align_to_byte();
        assert_eq!(writer.bits_written(), 8);
    }

    #[test]
    fn finish_into() {
        let mut writer = BitWriter::new();
        writer.write_u8(0xAB);

        let mut buf = vec![0x00, 0x11];
        writer.finish_into(&mut buf);
        assert_eq!(buf, vec![0x00, 0x11, 0xAB]);
    }
}
