//! Byte-budgeted packet construction and the fixed-width numeric record.
//!
//! Every write either fits entirely in the remaining budget or is refused;
//! a refused record never leaves partial bytes behind.
use core::fmt::Write;

use heapless::{String, Vec};

use super::samples::Position;
use crate::error::TelemetryError;
use crate::protocol::transport::LORA_FIFO_SIZE;

/// Length of one `ID:nnnnn\n` record.
pub const NUMERIC_RECORD_LEN: usize = 10;
/// Largest value a five-digit record can carry.
pub const NUMERIC_RECORD_MAX: u32 = 99_999;

/// One outbound packet under construction: header plus records.
#[derive(Debug)]
pub struct PacketWriter {
    bytes: Vec<u8, LORA_FIFO_SIZE>,
    remaining: usize,
}

impl PacketWriter {
    /// Start a packet with `header`; `max_len` counts the header too and is
    /// capped to the FIFO size.
    pub fn new(header: &[u8], max_len: usize) -> Self {
        let max_len = max_len.min(LORA_FIFO_SIZE);
        let mut bytes = Vec::new();
        let header = &header[..header.len().min(max_len)];
        // fits: header is capped to max_len above
        let _ = bytes.extend_from_slice(header);
        Self {
            bytes,
            remaining: max_len - header.len(),
        }
    }

    /// Bytes still available for records.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Whole packet, header included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Append `data` if it fits entirely, else refuse without writing.
    pub fn write(&mut self, data: &[u8]) -> Result<(), TelemetryError> {
        if data.len() > self.remaining {
            return Err(TelemetryError::BudgetExceeded {
                needed: data.len(),
                remaining: self.remaining,
            });
        }
        self.bytes
            .extend_from_slice(data)
            .map_err(|_| TelemetryError::BudgetExceeded {
                needed: data.len(),
                remaining: self.remaining,
            })?;
        self.remaining -= data.len();
        Ok(())
    }
}

/// A record identifier is three printable ASCII characters without `:`.
fn valid_id(id: &str) -> bool {
    id.len() == 3 && id.bytes().all(|b| b.is_ascii_graphic() && b != b':' && b != b'|')
}

/// Round a wire value to the five-digit unsigned range.
pub fn wire_value(value: f32) -> Option<u32> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let rounded = value + 0.5;
    if rounded >= (NUMERIC_RECORD_MAX + 1) as f32 {
        return None;
    }
    Some(rounded as u32)
}

/// Write `"<id>:<value, 5 digits zero padded>\n"`.
pub fn write_numeric_record(
    writer: &mut PacketWriter,
    id: &'static str,
    value: f32,
) -> Result<(), TelemetryError> {
    if !valid_id(id) {
        return Err(TelemetryError::RecordMalformed { id });
    }
    let value = wire_value(value).ok_or(TelemetryError::ValueOutOfRange { id })?;

    let mut record: String<12> = String::new();
    write!(record, "{}:{:05}\n", id, value).map_err(|_| TelemetryError::RecordMalformed { id })?;
    if record.len() != NUMERIC_RECORD_LEN {
        return Err(TelemetryError::RecordMalformed { id });
    }

    writer.write(record.as_bytes())
}

/// Longest sample record: `GPS:4294967295:-180.000000,-180.000000|`.
pub const SAMPLE_RECORD_CAPACITY: usize = 48;

/// Value part of a sample record.
pub trait SamplePayload {
    fn write_payload<W: Write>(&self, out: &mut W) -> core::fmt::Result;
}

/// Ground speed, tenths of mph.
impl SamplePayload for u16 {
    fn write_payload<W: Write>(&self, out: &mut W) -> core::fmt::Result {
        write!(out, "{}", self)
    }
}

/// `lat,lng` with six decimals (about 0.1 m).
impl SamplePayload for Position {
    fn write_payload<W: Write>(&self, out: &mut W) -> core::fmt::Result {
        write!(out, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Format one `"<id>:<delta-ms>:<payload>|"` sample record.
pub fn format_sample_record<T: SamplePayload>(
    id: &'static str,
    delta_ms: u32,
    value: &T,
) -> Result<String<SAMPLE_RECORD_CAPACITY>, TelemetryError> {
    let mut record = String::new();
    fill_sample_record(&mut record, id, delta_ms, value)
        .map_err(|_| TelemetryError::RecordMalformed { id })?;
    Ok(record)
}

fn fill_sample_record<T: SamplePayload>(
    record: &mut String<SAMPLE_RECORD_CAPACITY>,
    id: &str,
    delta_ms: u32,
    value: &T,
) -> core::fmt::Result {
    write!(record, "{}:{}:", id, delta_ms)?;
    value.write_payload(record)?;
    record.write_char('|')
}
