//! Raw frame relay: forwards bus traffic over the radio without decoding it.
//!
//! Frames are batched `RELAY_FRAMES_PER_PACKET` at a time. Each frame is
//! serialized as `[id: u32 LE][dlc: u8][data[..dlc]]` after the RadioHead
//! header. A batch that completes while the radio is still busy is thrown
//! away and collection starts over.
use heapless::Vec;

use crate::error::RadioError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::can_bus::FrameReceiver;
use crate::protocol::transport::traits::radio::{Radio, RadioState};
use crate::protocol::transport::{
    MAX_FRAMES_PER_UPDATE, RADIOHEAD_HEADER, RELAY_FRAMES_PER_PACKET,
};

/// Bytes one frame takes in a relay packet, at most.
pub const RELAYED_FRAME_MAX_LEN: usize = 4 + 1 + 8;
/// Largest relay packet, header included.
pub const RELAY_PACKET_MAX_LEN: usize =
    RADIOHEAD_HEADER.len() + RELAY_FRAMES_PER_PACKET * RELAYED_FRAME_MAX_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RelayOutcome {
    /// Frame added, batch not complete yet.
    Collecting,
    /// Batch complete and handed to the radio.
    Sent,
    /// Batch complete but the radio was busy or absent; batch dropped.
    Discarded,
}

#[derive(Debug, Default)]
pub struct FrameRelay {
    batch: Vec<CanFrame, RELAY_FRAMES_PER_PACKET>,
    packets_sent: u32,
    batches_discarded: u32,
}

impl FrameRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn packets_sent(&self) -> u32 {
        self.packets_sent
    }

    pub fn batches_discarded(&self) -> u32 {
        self.batches_discarded
    }

    /// Frames collected towards the next packet.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    /// Add one frame; transmit when the batch is complete.
    pub fn push<R: Radio>(
        &mut self,
        frame: CanFrame,
        radio: &mut R,
    ) -> Result<RelayOutcome, RadioError<R::Error>> {
        // never full here: a full batch is always flushed below
        let _ = self.batch.push(frame);
        if !self.batch.is_full() {
            return Ok(RelayOutcome::Collecting);
        }

        if radio.poll() != RadioState::Idle {
            self.batch.clear();
            self.batches_discarded = self.batches_discarded.wrapping_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("Radio busy, relay batch overwritten");
            return Ok(RelayOutcome::Discarded);
        }

        let packet = encode_batch(&self.batch);
        self.batch.clear();
        radio
            .start_transmit(&packet)
            .map_err(RadioError::Transmit)?;
        self.packets_sent = self.packets_sent.wrapping_add(1);
        Ok(RelayOutcome::Sent)
    }

    /// Drain the bus (bounded) and relay what arrives. Returns the number of
    /// packets sent.
    pub fn relay_from<B: FrameReceiver, R: Radio>(
        &mut self,
        bus: &mut B,
        radio: &mut R,
    ) -> Result<usize, RadioError<R::Error>> {
        let mut sent = 0;
        for _ in 0..MAX_FRAMES_PER_UPDATE {
            let frame = match bus.try_receive() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("CAN receive error: {}", defmt::Debug2Format(&_err));
                    break;
                }
            };
            if self.push(frame, radio)? == RelayOutcome::Sent {
                sent += 1;
            }
        }
        Ok(sent)
    }
}

/// Serialize a batch behind the RadioHead header.
pub fn encode_batch(frames: &[CanFrame]) -> Vec<u8, RELAY_PACKET_MAX_LEN> {
    let mut packet = Vec::new();
    // capacity covers header plus a full batch of eight-byte frames
    let _ = packet.extend_from_slice(&RADIOHEAD_HEADER);
    for frame in frames.iter().take(RELAY_FRAMES_PER_PACKET) {
        let _ = packet.extend_from_slice(&(frame.raw_id() as u32).to_le_bytes());
        let _ = packet.push(frame.payload().len() as u8);
        let _ = packet.extend_from_slice(frame.payload());
    }
    packet
}

/// Inverse of [`encode_batch`] for the receiving side: yields the frames
/// found after the header and stops at the first truncated one.
pub fn decode_batch(packet: &[u8]) -> Vec<CanFrame, RELAY_FRAMES_PER_PACKET> {
    let mut frames = Vec::new();
    let mut rest = packet.get(RADIOHEAD_HEADER.len()..).unwrap_or(&[]);

    while rest.len() >= 5 && !frames.is_full() {
        let id = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let dlc = rest[4] as usize;
        let Some(data) = rest.get(5..5 + dlc) else {
            break;
        };
        let Some(frame) = u16::try_from(id).ok().and_then(|id| CanFrame::new(id, data)) else {
            break;
        };
        let _ = frames.push(frame);
        rest = &rest[5 + dlc..];
    }
    frames
}
