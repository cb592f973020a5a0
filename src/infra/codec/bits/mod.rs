//! Low-level components dedicated to bit manipulation for CAN payloads.
//! Signals are addressed by absolute bit offset (DBC `@1` little-endian
//! layout): bit 0 is the least significant bit of byte 0, bit 8 the least
//! significant bit of byte 1, and so on.
use crate::error::{BitReaderError, BitWriterError};

/// Reader extracting bit fields from a `&[u8]` without copies.
pub struct BitReader<'a> {
    buffer: &'a [u8],
    /// Absolute position, in bits, of the next read.
    bit_cursor: usize,
}

impl<'a> BitReader<'a> {
    /// Create a reader positioned at bit 0.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            bit_cursor: 0,
        }
    }

    /// Move the cursor to an absolute bit position.
    pub fn seek(&mut self, bit_offset: usize) -> Result<(), BitReaderError> {
        let len_bits = self.buffer.len() * 8;
        if bit_offset > len_bits {
            return Err(BitReaderError::OutOfBounds {
                asked: bit_offset,
                available: len_bits,
            });
        }
        self.bit_cursor = bit_offset;
        Ok(())
    }

    /// Read `num_bits` (1..=64) starting at the cursor, little-endian.
    pub fn read_u64(&mut self, num_bits: u8) -> Result<u64, BitReaderError> {
        if !(1..=64).contains(&num_bits) {
            return Err(BitReaderError::TooLongForType {
                max: 64,
                asked: num_bits,
            });
        }

        let len_bits = self.buffer.len() * 8;
        if self.bit_cursor + num_bits as usize > len_bits {
            return Err(BitReaderError::OutOfBounds {
                asked: num_bits as usize,
                available: len_bits - self.bit_cursor,
            });
        }

        let mut result: u64 = 0;
        let mut done: usize = 0;
        let wanted = num_bits as usize;

        while done < wanted {
            let position = self.bit_cursor + done;
            let shift = position % 8;
            let chunk = (8 - shift).min(wanted - done);

            let mask = ((1u16 << chunk) - 1) as u8;
            let bits = (self.buffer[position / 8] >> shift) & mask;
            result |= (bits as u64) << done;

            done += chunk;
        }

        self.bit_cursor += wanted;
        Ok(result)
    }

    /// Read `num_bits` located at an absolute offset.
    pub fn read_at(&mut self, bit_offset: usize, num_bits: u8) -> Result<u64, BitReaderError> {
        self.seek(bit_offset)?;
        self.read_u64(num_bits)
    }
}
//==================================================================================BITWRITER

/// Writer laying bit fields into a `&mut [u8]` without assuming alignment.
/// Bits outside the written fields are left untouched.
pub struct BitWriter<'a> {
    buffer: &'a mut [u8],
    bit_cursor: usize,
}

impl<'a> BitWriter<'a> {
    /// Create a writer positioned at bit 0.
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            bit_cursor: 0,
        }
    }

    /// Move the cursor to an absolute bit position.
    pub fn seek(&mut self, bit_offset: usize) -> Result<(), BitWriterError> {
        let len_bits = self.buffer.len() * 8;
        if bit_offset > len_bits {
            return Err(BitWriterError::OutOfBounds {
                asked: bit_offset,
                available: len_bits,
            });
        }
        self.bit_cursor = bit_offset;
        Ok(())
    }

    /// Write the low `num_bits` of `value` at the cursor, little-endian.
    pub fn write_u64(&mut self, value: u64, num_bits: u8) -> Result<(), BitWriterError> {
        if !(1..=64).contains(&num_bits) {
            return Err(BitWriterError::TooLongForType {
                max: 64,
                asked: num_bits,
            });
        }

        let len_bits = self.buffer.len() * 8;
        if self.bit_cursor + num_bits as usize > len_bits {
            return Err(BitWriterError::OutOfBounds {
                asked: num_bits as usize,
                available: len_bits - self.bit_cursor,
            });
        }

        let mut remaining = value;
        let mut done: usize = 0;
        let wanted = num_bits as usize;

        while done < wanted {
            let position = self.bit_cursor + done;
            let shift = position % 8;
            let chunk = (8 - shift).min(wanted - done);

            let mask = ((1u16 << chunk) - 1) as u8;
            let byte = &mut self.buffer[position / 8];
            *byte &= !(mask << shift);
            *byte |= (remaining as u8 & mask) << shift;
            remaining >>= chunk;

            done += chunk;
        }

        self.bit_cursor += wanted;
        Ok(())
    }

    /// Write `num_bits` of `value` at an absolute offset.
    pub fn write_at(
        &mut self,
        bit_offset: usize,
        value: u64,
        num_bits: u8,
    ) -> Result<(), BitWriterError> {
        self.seek(bit_offset)?;
        self.write_u64(value, num_bits)
    }
}

//==================================================================================TEST_BITS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
