//! Generic decode/encode engine driven by the static frame schemas.
//! One routine interprets every bit-packed message; there is no
//! hand-written decoder per identifier.
use super::bits::{BitReader, BitWriter};
use super::traits::SignalAccess;
use crate::core::{FrameSchema, SignalDescriptor};
use crate::error::{DecodeSkipped, EncodeError};

/// Decode a payload into `target` following `schema`.
///
/// # Parameters
/// * `target` – structure receiving the physical values
/// * `payload` – the meaningful bytes of the frame (`data[..len]`)
/// * `schema` – static layout for the frame identifier
///
/// The payload length is checked against the schema before anything is
/// written, so a short frame leaves `target` untouched.
pub fn decode_into<T: SignalAccess>(
    target: &mut T,
    payload: &[u8],
    schema: &'static FrameSchema,
) -> Result<(), DecodeSkipped> {
    if payload.is_empty() {
        return Err(DecodeSkipped::EmptyFrame);
    }

    let needed = schema.required_len();
    if payload.len() < needed {
        return Err(DecodeSkipped::PayloadTooShort {
            needed,
            available: payload.len(),
        });
    }

    let mut reader = BitReader::new(payload);
    for desc in schema.signals() {
        let raw = reader
            .read_at(desc.bit_offset as usize, desc.bit_width)
            .map_err(|err| DecodeSkipped::BitReaderError { err })?;
        // Structures may carry only a subset of the broadcast.
        let _ = target.set_signal(desc.signal, raw_to_physical(raw, desc));
    }

    Ok(())
}

/// Encode the signals of `schema` read from `source` into `buffer`.
///
/// Bits not covered by a signal (reserved ranges) are written as zero.
/// Returns the payload length on success.
pub fn encode_from<T: SignalAccess>(
    source: &T,
    buffer: &mut [u8],
    schema: &'static FrameSchema,
) -> Result<usize, EncodeError> {
    let signals = schema.signals();
    if signals.is_empty() {
        return Err(EncodeError::UnknownIdentifier { id: schema.id });
    }

    let len = schema.length as usize;
    if buffer.len() < len {
        return Err(EncodeError::BitWriteError {
            err: crate::error::BitWriterError::OutOfBounds {
                asked: len * 8,
                available: buffer.len() * 8,
            },
        });
    }
    buffer[..len].fill(0);

    let mut writer = BitWriter::new(&mut buffer[..len]);
    for desc in signals {
        let value = source
            .signal(desc.signal)
            .ok_or(EncodeError::SignalNotFound {
                signal: desc.signal,
            })?;
        let raw = physical_to_raw(value, desc)?;
        writer
            .write_at(desc.bit_offset as usize, raw, desc.bit_width)
            .map_err(|err| EncodeError::BitWriteError { err })?;
    }

    Ok(len)
}

/// Apply sign, scale and offset to a raw field.
pub fn raw_to_physical(raw: u64, desc: &SignalDescriptor) -> f32 {
    let counts = if desc.signed {
        sign_extend(raw, desc.bit_width) as f32
    } else {
        raw as f32
    };
    counts * desc.scale + desc.offset
}

/// Inverse of [`raw_to_physical`]: round to the nearest count and check the
/// result fits the field's width and signedness.
pub fn physical_to_raw(value: f32, desc: &SignalDescriptor) -> Result<u64, EncodeError> {
    let out_of_range = EncodeError::ValueOutOfRange { name: desc.name };

    let counts = (value - desc.offset) / desc.scale;
    if !counts.is_finite() {
        return Err(out_of_range);
    }
    let rounded = round_half_away(counts);

    let width = desc.bit_width as u32;
    let (min, max) = if desc.signed {
        (-(1i128 << (width - 1)), (1i128 << (width - 1)) - 1)
    } else {
        (0, (1i128 << width) - 1)
    };
    if rounded < min || rounded > max {
        return Err(out_of_range);
    }

    // Two's complement for negative counts; the writer keeps the low bits.
    Ok(rounded as u64)
}

fn round_half_away(value: f32) -> i128 {
    if value >= 0.0 {
        (value + 0.5) as i128
    } else {
        (value - 0.5) as i128
    }
}

/// Reinterpret the low `bits` of `value` as a two's-complement integer.
/// Correct for any width, not only 8 and 16.
pub(crate) fn sign_extend(value: u64, bits: u8) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }

    let sign_bit = 1u64 << (bits - 1);
    if value & sign_bit != 0 {
        (value | (u64::MAX << bits)) as i64
    } else {
        (value & ((1u64 << bits) - 1)) as i64
    }
}
