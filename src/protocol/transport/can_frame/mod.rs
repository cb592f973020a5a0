//! In-memory representation of a classic 11-bit CAN frame.
use core::fmt;
use embedded_can::{Frame, Id, StandardId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Raw frame as read from or written to the vehicle bus.
pub struct CanFrame {
    /// 11-bit identifier.
    pub id: StandardId,
    /// Payload buffer. Classic CAN frames always provide eight bytes.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame from a raw identifier. `None` if the identifier does not
    /// fit 11 bits or the payload exceeds eight bytes.
    pub fn new(id: u16, payload: &[u8]) -> Option<Self> {
        let id = StandardId::new(id)?;
        if payload.len() > 8 {
            return None;
        }
        let mut data = [0u8; 8];
        data[..payload.len()].copy_from_slice(payload);
        Some(Self {
            id,
            data,
            len: payload.len(),
        })
    }

    /// Identifier as a plain integer.
    pub fn raw_id(&self) -> u16 {
        self.id.as_raw()
    }

    /// Meaningful bytes only.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len.min(8)]
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) => CanFrame::new(id.as_raw(), data),
            Id::Extended(_) => None,
        }
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        Id::Standard(self.id)
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

/// `"<ID> <DLC> <B0> <B1> ..."` in upper-case hex, the format of the bus dump tool.
impl fmt::Display for CanFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X} {}", self.raw_id(), self.len)?;
        for byte in self.payload() {
            write!(f, " {:02X}", byte)?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CanFrame {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CanFrame {{ id: {=u16:#x}, data: {=[u8]:#x} }}", self.raw_id(), self.payload());
    }
}
