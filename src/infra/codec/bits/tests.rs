//! Edge cases for offset-addressed BitReader and BitWriter.
use super::*;

#[test]
/// Little-endian 16-bit assembly from two aligned bytes.
fn test_read_aligned_u16() {
    let data = [0x10, 0x27, 0x00, 0x00];
    let mut reader = BitReader::new(&data);
    assert_eq!(reader.read_at(0, 16).unwrap(), 10_000);
    assert_eq!(reader.read_at(16, 16).unwrap(), 0);
}

#[test]
/// Single status bits inside one byte.
fn test_read_individual_bits() {
    // bit 32 = 1, bit 33 = 0, bit 38 = 1
    let data = [0, 0, 0, 0, 0b0100_0001];
    let mut reader = BitReader::new(&data);
    assert_eq!(reader.read_at(32, 1).unwrap(), 1);
    assert_eq!(reader.read_at(33, 1).unwrap(), 0);
    assert_eq!(reader.read_at(38, 1).unwrap(), 1);
}

#[test]
/// A 12-bit field starting mid-byte spans two bytes.
fn test_read_unaligned_span() {
    // bits 4..16 of [0xAF, 0xFA] -> 0xFAA
    let data = [0xAF, 0xFA];
    let mut reader = BitReader::new(&data);
    assert_eq!(reader.read_at(4, 12).unwrap(), 0xFAA);
}

#[test]
/// Full 64-bit read.
fn test_read_max_width() {
    let data = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    let mut reader = BitReader::new(&data);
    assert_eq!(reader.read_u64(64).unwrap(), 0x8877_6655_4433_2211);
}

#[test]
/// Reads past the end of a short payload are refused.
fn test_read_out_of_bounds() {
    let data = [0xFF, 0xFF];
    let mut reader = BitReader::new(&data);
    assert_eq!(
        reader.read_at(8, 16),
        Err(BitReaderError::OutOfBounds {
            asked: 16,
            available: 8
        })
    );
    assert!(matches!(
        reader.seek(17),
        Err(BitReaderError::OutOfBounds { .. })
    ));
}

#[test]
/// Zero and oversized widths are refused.
fn test_read_invalid_width() {
    let data = [0u8; 16];
    let mut reader = BitReader::new(&data);
    assert_eq!(
        reader.read_u64(0),
        Err(BitReaderError::TooLongForType { max: 64, asked: 0 })
    );
    assert_eq!(
        reader.read_u64(65),
        Err(BitReaderError::TooLongForType { max: 64, asked: 65 })
    );
}

#[test]
/// Writes preserve neighbouring bits.
fn test_write_preserves_neighbours() {
    let mut data = [0xFF; 2];
    let mut writer = BitWriter::new(&mut data);
    writer.write_at(4, 0, 8).unwrap();
    assert_eq!(data, [0x0F, 0xF0]);
}

#[test]
/// Written fields read back at the same offsets.
fn test_write_then_read() {
    let mut data = [0u8; 8];
    {
        let mut writer = BitWriter::new(&mut data);
        writer.write_at(0, 0x1234, 16).unwrap();
        writer.write_at(35, 0b101, 3).unwrap();
        writer.write_at(48, 0xBEEF, 16).unwrap();
    }
    assert_eq!(data[0], 0x34);
    assert_eq!(data[1], 0x12);
    assert_eq!(data[4], 0b0010_1000);
    assert_eq!(&data[6..8], &[0xEF, 0xBE]);
}

#[test]
/// Only the low `num_bits` of the value are stored.
fn test_write_masks_value() {
    let mut data = [0u8; 1];
    let mut writer = BitWriter::new(&mut data);
    writer.write_u64(0xFFFF, 3).unwrap();
    assert_eq!(data[0], 0b0000_0111);
}

#[test]
/// Writes past the end of the buffer are refused.
fn test_write_out_of_bounds() {
    let mut data = [0u8; 1];
    let mut writer = BitWriter::new(&mut data);
    assert_eq!(
        writer.write_at(4, 0xFF, 8),
        Err(BitWriterError::OutOfBounds {
            asked: 8,
            available: 4
        })
    );
    assert_eq!(data[0], 0);
}
