//! Error definitions shared across library modules.
//! Each type models one failure scenario. None of them is fatal to the
//! control loop: callers log, drop the offending unit of work, and retry on
//! the next iteration.
use crate::core::Signal;
use thiserror_no_std::Error;

//==================================================================================BITREADER_ERRORS
#[derive(Debug, Error, PartialEq, Eq)]
/// Errors raised during bitwise buffer reads.
pub enum BitReaderError {
    /// Attempted to read past the end of the buffer.
    #[error("Attempted to read out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
    /// Requested a width outside 1..=64.
    #[error("Cannot read more than {max} bits. Requested: {asked}")]
    TooLongForType { max: u8, asked: u8 },
}
//==================================================================================BITWRITER_ERRORS
#[derive(Debug, Error, PartialEq, Eq)]
/// Errors raised during bitwise writes into a buffer.
pub enum BitWriterError {
    /// Attempted to write beyond the provided capacity.
    #[error("Attempted to write out of bounds -> asked: {asked}, available: {available}")]
    OutOfBounds { asked: usize, available: usize },
    /// Requested a width outside 1..=64.
    #[error("Cannot write more than {max} bits. Requested: {asked}")]
    TooLongForType { max: u8, asked: u8 },
}

//================================================================================CODEC_ERROR
#[derive(Debug, Error, PartialEq, Eq)]
/// Reasons a received frame was not applied to the engine state.
pub enum DecodeSkipped {
    /// No schema exists for this identifier.
    #[error("Unknown identifier {id}")]
    UnknownIdentifier { id: u16 },
    /// Frame carried no data bytes.
    #[error("Empty frame")]
    EmptyFrame,
    /// Frame is shorter than the schema requires.
    #[error("Payload too short: needed {needed}, got {available}")]
    PayloadTooShort { needed: usize, available: usize },
    /// Bit-level access failed.
    #[error("BitReader error: {err}")]
    BitReaderError { err: BitReaderError },
    /// GPS coordinate is not finite or outside its WGS84 range.
    #[error("Invalid coordinate in frame {id}")]
    InvalidCoordinate { id: u16 },
}

#[derive(Debug, Error, PartialEq, Eq)]
/// Failures while building a payload from a state structure.
pub enum EncodeError {
    /// No schema exists for this identifier, or it is not bit-packed.
    #[error("No signal schema for identifier {id}")]
    UnknownIdentifier { id: u16 },
    /// The source structure does not expose this signal.
    #[error("Signal {signal:?} not available")]
    SignalNotFound { signal: Signal },
    /// Physical value does not fit the raw field once scaled.
    #[error("Value out of range for {name}")]
    ValueOutOfRange { name: &'static str },
    /// Failed while writing bits into the payload.
    #[error("BitWrite error: {err}")]
    BitWriteError { err: BitWriterError },
}

//==================================================================================TRANSPORT_ERROR
#[derive(Debug, Error, PartialEq, Eq)]
/// Outcome of a non-blocking frame transmission that did not succeed.
pub enum SendError<E: core::fmt::Debug> {
    /// All transmit buffers are occupied; retry on the next loop iteration.
    #[error("CAN transmit buffers busy")]
    Busy,
    /// Controller fault (init failure, bus-off, ...).
    #[error("CAN bus failure: {0:?}")]
    Failure(E),
}

#[derive(Debug, Error, PartialEq, Eq)]
/// The radio refused to start a transmission.
pub enum RadioError<E: core::fmt::Debug> {
    /// Driver error while handing the packet to the modem.
    #[error("Radio transmit failed: {0:?}")]
    Transmit(E),
}

//==================================================================================TELEMETRY_ERROR
#[derive(Debug, Error, PartialEq, Eq)]
/// A telemetry record was rejected; the packet under construction is intact.
pub enum TelemetryError {
    /// The record does not have the fixed `ID:nnnnn\n` shape (bad identifier).
    #[error("Malformed record for id {id}")]
    RecordMalformed { id: &'static str },
    /// Value is negative, not finite, or needs more than five digits.
    #[error("Value out of range for id {id}")]
    ValueOutOfRange { id: &'static str },
    /// Writing the record would exceed the remaining packet budget.
    #[error("Packet budget exceeded: needed {needed}, remaining {remaining}")]
    BudgetExceeded { needed: usize, remaining: usize },
}

//==================================================================================FRAMING_ERROR
#[derive(Debug, Error, PartialEq, Eq)]
/// Errors raised by the base-station serial framing.
pub enum FramingError {
    /// Destination buffer cannot hold the encoded frame.
    #[error("Output buffer too small: needed {needed}, available {available}")]
    BufferTooSmall { needed: usize, available: usize },
    /// Encoded input contains an invalid code sequence.
    #[error("Malformed frame")]
    Malformed,
}
