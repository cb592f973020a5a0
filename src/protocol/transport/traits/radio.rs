//! Packet radio seen by the telemetry packetizer and the relay.
//!
//! Transmission is asynchronous on the modem side: `start_transmit` hands the
//! packet over and returns at once, and completion is observed by polling.

/// Transmitter state as last reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioState {
    /// Not initialised, or the modem stopped answering.
    Unavailable,
    /// Ready to accept a packet.
    Idle,
    /// A previous packet is still on air.
    Transmitting,
}

pub trait Radio {
    type Error: core::fmt::Debug;

    /// Largest packet, header included, the modem accepts.
    fn max_payload(&self) -> usize;

    /// Poll the transmitter. Must not block.
    fn poll(&mut self) -> RadioState;

    /// Begin sending `packet` (header included). Only called after `poll`
    /// returned [`RadioState::Idle`].
    fn start_transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error>;
}
