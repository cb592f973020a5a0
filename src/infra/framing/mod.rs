//! Serial framing used by the base station to forward radio payloads to a
//! host. Each payload becomes one COBS block followed by a `0x00` terminator.
//!
//! Two flavours exist:
//! * [`Framing::RelayCompatible`] eliminates `0x0F` instead of `0x00`. This is
//!   what deployed base stations emit, so hosts already in the field expect it.
//!   Payload bytes equal to `0x00` pass through unescaped, which means the
//!   terminator is only reliable for payloads without zeros (the ASCII
//!   telemetry records qualify, the RadioHead header does not).
//! * [`Framing::Standard`] is plain zero-byte COBS, delegated to the `cobs` crate.
use crate::error::FramingError;

/// Byte eliminated by the relay-compatible encoder.
pub const RELAY_TRIGGER_BYTE: u8 = 0x0F;
/// Frame delimiter on the serial link, for both flavours.
pub const FRAME_TERMINATOR: u8 = 0x00;

/// Longest run of literal bytes a single code byte can announce.
const MAX_RUN: usize = 0xFE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
    /// Bit-exact with existing base stations (`0x0F` trigger byte).
    #[default]
    RelayCompatible,
    /// Zero-byte COBS.
    Standard,
}

impl Framing {
    fn trigger(self) -> u8 {
        match self {
            Framing::RelayCompatible => RELAY_TRIGGER_BYTE,
            Framing::Standard => 0x00,
        }
    }
}

/// Worst-case encoded size of `len` payload bytes, terminator included.
pub const fn max_encoded_len(len: usize) -> usize {
    // one code byte, one extra per full run, one terminator
    len + len / MAX_RUN + 2
}

/// Encode `src` into `dst` and append the terminator.
///
/// Returns the number of bytes written to `dst`.
pub fn encode(src: &[u8], dst: &mut [u8], framing: Framing) -> Result<usize, FramingError> {
    let needed = max_encoded_len(src.len());
    if dst.len() < needed {
        return Err(FramingError::BufferTooSmall {
            needed,
            available: dst.len(),
        });
    }

    let written = match framing {
        Framing::Standard => {
            cobs::try_encode(src, dst).map_err(|_| FramingError::BufferTooSmall {
                needed,
                available: dst.len(),
            })?
        }
        Framing::RelayCompatible => encode_with_trigger(src, dst, framing.trigger()),
    };

    dst[written] = FRAME_TERMINATOR;
    Ok(written + 1)
}

/// Decode one frame in place and return the payload length.
///
/// `buf` holds a single encoded frame. With [`Framing::Standard`] the trailing
/// terminator is optional. With [`Framing::RelayCompatible`] it is required:
/// payload zeros travel unescaped there, so a missing terminator cannot be
/// told apart from a payload ending in `0x00`.
pub fn decode(buf: &mut [u8], framing: Framing) -> Result<usize, FramingError> {
    let end = match (buf.last(), framing) {
        (Some(&FRAME_TERMINATOR), _) => buf.len() - 1,
        (_, Framing::Standard) => buf.len(),
        (_, Framing::RelayCompatible) => return Err(FramingError::Malformed),
    };
    let frame = &mut buf[..end];

    match framing {
        Framing::Standard => cobs::decode_in_place(frame).map_err(|_| FramingError::Malformed),
        Framing::RelayCompatible => decode_with_trigger(frame, framing.trigger()),
    }
}

/// COBS block encoding with an arbitrary eliminated byte. `dst` must hold at
/// least `max_encoded_len(src.len()) - 1` bytes. No terminator is written.
fn encode_with_trigger(src: &[u8], dst: &mut [u8], trigger: u8) -> usize {
    let mut code_idx = 0;
    let mut out = 1;
    let mut code: u8 = 1;

    for &byte in src {
        if byte == trigger {
            dst[code_idx] = code;
            code_idx = out;
            out += 1;
            code = 1;
            continue;
        }

        dst[out] = byte;
        out += 1;
        code += 1;

        if code == 0xFF {
            // full run: close the block, the next one carries no implied trigger
            dst[code_idx] = code;
            code_idx = out;
            out += 1;
            code = 1;
        }
    }

    dst[code_idx] = code;
    out
}

/// Inverse of [`encode_with_trigger`], writing the payload back over `buf`.
fn decode_with_trigger(buf: &mut [u8], trigger: u8) -> Result<usize, FramingError> {
    let mut read = 0;
    let mut write = 0;

    while read < buf.len() {
        let code = buf[read] as usize;
        if code == 0 {
            return Err(FramingError::Malformed);
        }
        read += 1;

        let run = code - 1;
        if read + run > buf.len() {
            return Err(FramingError::Malformed);
        }
        buf.copy_within(read..read + run, write);
        read += run;
        write += run;

        if code != 0xFF && read < buf.len() {
            buf[write] = trigger;
            write += 1;
        }
    }

    Ok(write)
}
