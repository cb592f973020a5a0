//! Telemetry packetizer: one LoRa packet per call, never two on air.
//!
//! ## Packet layout
//!
//! ```text
//! FF FF 00 00                      RadioHead header
//! RPM:04200\n P_O:00058\n ...      tier one, every packet
//! P_C:00142\n VBA:13800\n ...      tier two, even packets only
//! GPS:120:44.500000,-123.250000|...\n
//! SPD:120:385|SPD:20:386|...\n
//! ```
//!
//! Numeric records are written until the budget refuses one; each refusal
//! drops that record only. Sample lines then take whatever space is left,
//! oldest sample first, and stop at the first sample that does not fit.
//! Unformattable samples are skipped and counted as rejected. Only samples
//! that made it into a transmitted packet, or were rejected on the way, leave
//! their ring.
use embassy_time::Instant;

use super::channels::{Channel, GPS_LINE_ID, SPEED_LINE_ID, TIER_ONE, TIER_TWO};
use super::record::{format_sample_record, write_numeric_record, PacketWriter, SamplePayload};
use super::samples::{SampleQueue, SampleQueues};
use super::source::TelemetrySource;
use crate::error::RadioError;
use crate::protocol::transport::traits::radio::{Radio, RadioState};
use crate::protocol::transport::{LORA_FIFO_SIZE, RADIOHEAD_HEADER};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketizerConfig {
    /// Bytes prepended to every packet, counted against the packet size.
    pub header: [u8; 4],
    /// Packet size limit, header included. The radio's own limit also applies.
    pub max_packet_len: usize,
}

impl Default for PacketizerConfig {
    fn default() -> Self {
        Self {
            header: RADIOHEAD_HEADER,
            max_packet_len: LORA_FIFO_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketOutcome {
    /// Packet handed to the radio.
    Sent,
    /// Previous packet still on air; nothing built.
    SkippedBusy,
    /// Radio absent or failed; nothing built.
    SkippedUnavailable,
}

#[derive(Debug, Default)]
pub struct Packetizer {
    config: PacketizerConfig,
    packet_counter: u32,
    rejected_records: u32,
    last_packet_len: usize,
}

impl Packetizer {
    pub fn new(config: PacketizerConfig) -> Self {
        Self {
            config,
            packet_counter: 0,
            rejected_records: 0,
            last_packet_len: 0,
        }
    }

    /// Packets handed to the radio so far.
    pub fn packet_counter(&self) -> u32 {
        self.packet_counter
    }

    /// Records and samples refused (budget, malformed id, out-of-range value,
    /// unformattable sample) since creation.
    pub fn rejected_records(&self) -> u32 {
        self.rejected_records
    }

    /// Size of the last packet sent, header included.
    pub fn last_packet_len(&self) -> usize {
        self.last_packet_len
    }

    /// Build one packet from `source` and `samples` and start sending it.
    ///
    /// Returns without building anything when the radio is not idle, or when
    /// its payload limit cannot even hold the header. A driver error leaves
    /// the packet counter and the sample rings untouched.
    pub fn build_and_send<R: Radio, S: TelemetrySource>(
        &mut self,
        radio: &mut R,
        source: &S,
        samples: &mut SampleQueues,
        now: Instant,
    ) -> Result<PacketOutcome, RadioError<R::Error>> {
        match radio.poll() {
            RadioState::Unavailable => return Ok(PacketOutcome::SkippedUnavailable),
            RadioState::Transmitting => return Ok(PacketOutcome::SkippedBusy),
            RadioState::Idle => {}
        }

        let max_len = self.config.max_packet_len.min(radio.max_payload());
        if max_len < self.config.header.len() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Radio payload {} cannot hold the packet header", max_len);
            return Ok(PacketOutcome::SkippedUnavailable);
        }
        let mut writer = PacketWriter::new(&self.config.header, max_len);

        self.write_tier(&mut writer, source, &TIER_ONE);
        if self.packet_counter % 2 == 0 {
            self.write_tier(&mut writer, source, &TIER_TWO);
        }

        let positions = write_sample_line(&mut writer, GPS_LINE_ID, &samples.position, now);
        let speeds = write_sample_line(&mut writer, SPEED_LINE_ID, &samples.speed, now);

        radio.start_transmit(writer.as_bytes()).map_err(|err| {
            #[cfg(feature = "defmt")]
            defmt::error!("Radio refused telemetry packet");
            RadioError::Transmit(err)
        })?;

        samples.position.consume(positions.consumed);
        samples.speed.consume(speeds.consumed);
        self.rejected_records = self
            .rejected_records
            .wrapping_add((positions.rejected + speeds.rejected) as u32);
        self.last_packet_len = writer.as_bytes().len();
        self.packet_counter = self.packet_counter.wrapping_add(1);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Telemetry packet #{} sent: {} bytes, {} positions, {} speeds",
            self.packet_counter,
            self.last_packet_len,
            positions.consumed - positions.rejected,
            speeds.consumed - speeds.rejected
        );

        Ok(PacketOutcome::Sent)
    }

    fn write_tier<S: TelemetrySource>(
        &mut self,
        writer: &mut PacketWriter,
        source: &S,
        channels: &[Channel],
    ) {
        for &channel in channels {
            let Some(value) = source.value(channel) else {
                continue;
            };
            if let Err(_err) = write_numeric_record(writer, channel.id(), value) {
                self.rejected_records = self.rejected_records.wrapping_add(1);
                #[cfg(feature = "defmt")]
                defmt::warn!("Telemetry record dropped: {}", defmt::Display2Format(&_err));
            }
        }
    }
}

/// How far a sample line got through its ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SampleLine {
    /// Samples to drop from the ring once the packet is on air.
    consumed: usize,
    /// Samples that could not be formatted. Included in `consumed`.
    rejected: usize,
}

/// Pack the oldest samples of `queue` into one `\n`-terminated line. The
/// line is only written if at least one sample fits together with its
/// terminator. A sample that cannot be formatted is skipped and consumed,
/// so it cannot block the ring; packing stops at the first one over budget.
fn write_sample_line<T: SamplePayload, const N: usize>(
    writer: &mut PacketWriter,
    id: &'static str,
    queue: &SampleQueue<T, N>,
    now: Instant,
) -> SampleLine {
    let mut line = SampleLine::default();

    while let Some(sample) = queue.get(line.consumed) {
        let age = now.saturating_duration_since(sample.at).as_millis();
        let delta = u32::try_from(age).unwrap_or(u32::MAX);

        let record = match format_sample_record(id, delta, &sample.value) {
            Ok(record) => record,
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Sample dropped: {}", defmt::Display2Format(&_err));
                line.consumed += 1;
                line.rejected += 1;
                continue;
            }
        };
        // keep one byte for the line terminator
        if record.len() + 1 > writer.remaining() {
            break;
        }
        if writer.write(record.as_bytes()).is_err() {
            break;
        }
        line.consumed += 1;
    }

    if line.consumed > line.rejected {
        // reserved above
        let _ = writer.write(b"\n");
    }
    line
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
