//! Packetizer: radio gating, tiers, budget and sample draining.
use super::*;
use crate::protocol::telemetry::samples::Position;
use std::vec::Vec;

struct MockRadio {
    state: RadioState,
    max_payload: usize,
    fail: bool,
    sent: Vec<Vec<u8>>,
}

impl MockRadio {
    fn idle() -> Self {
        Self {
            state: RadioState::Idle,
            max_payload: LORA_FIFO_SIZE,
            fail: false,
            sent: Vec::new(),
        }
    }

    /// Simulate the modem's "transmit done" interrupt.
    fn complete(&mut self) {
        self.state = RadioState::Idle;
    }

    fn last_text(&self) -> std::string::String {
        let packet = self.sent.last().unwrap();
        std::string::String::from_utf8(packet[4..].to_vec()).unwrap()
    }
}

impl Radio for MockRadio {
    type Error = &'static str;

    fn max_payload(&self) -> usize {
        self.max_payload
    }

    fn poll(&mut self) -> RadioState {
        self.state
    }

    fn start_transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err("spi timeout");
        }
        self.sent.push(packet.to_vec());
        self.state = RadioState::Transmitting;
        Ok(())
    }
}

/// Same value on every channel.
struct Constant(f32);

impl TelemetrySource for Constant {
    fn value(&self, _channel: Channel) -> Option<f32> {
        Some(self.0)
    }
}

/// Tier-one channels only.
struct CriticalOnly;

impl TelemetrySource for CriticalOnly {
    fn value(&self, channel: Channel) -> Option<f32> {
        TIER_ONE.contains(&channel).then_some(1.0)
    }
}

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

fn fill_samples(samples: &mut SampleQueues, positions: usize, speeds: usize) {
    for _ in 0..positions {
        samples.position.push(
            at(0),
            Position {
                latitude: 44.5,
                longitude: -123.25,
            },
        );
    }
    for _ in 0..speeds {
        samples.speed.push(at(0), 385);
    }
}

#[test]
/// Nothing is built while the previous packet is on air.
fn test_skip_while_transmitting() {
    let mut radio = MockRadio::idle();
    radio.state = RadioState::Transmitting;
    let mut samples = SampleQueues::new();
    fill_samples(&mut samples, 3, 3);
    let mut packetizer = Packetizer::default();

    let outcome = packetizer
        .build_and_send(&mut radio, &Constant(1.0), &mut samples, at(0))
        .unwrap();
    assert_eq!(outcome, PacketOutcome::SkippedBusy);
    assert!(radio.sent.is_empty());
    assert_eq!(samples.position.len(), 3);
    assert_eq!(packetizer.packet_counter(), 0);
}

#[test]
/// A missing radio is reported, not an error.
fn test_skip_when_unavailable() {
    let mut radio = MockRadio::idle();
    radio.state = RadioState::Unavailable;
    let mut packetizer = Packetizer::default();

    let outcome = packetizer
        .build_and_send(&mut radio, &Constant(1.0), &mut SampleQueues::new(), at(0))
        .unwrap();
    assert_eq!(outcome, PacketOutcome::SkippedUnavailable);
}

#[test]
/// Two back-to-back calls without a completion send exactly one packet.
fn test_never_two_packets_in_flight() {
    let mut radio = MockRadio::idle();
    let mut samples = SampleQueues::new();
    let mut packetizer = Packetizer::default();

    let first = packetizer.build_and_send(&mut radio, &CriticalOnly, &mut samples, at(0));
    let second = packetizer.build_and_send(&mut radio, &CriticalOnly, &mut samples, at(1));
    assert_eq!(first, Ok(PacketOutcome::Sent));
    assert_eq!(second, Ok(PacketOutcome::SkippedBusy));
    assert_eq!(radio.sent.len(), 1);
}

#[test]
/// Tier two rides on even packets only; the header leads every packet.
fn test_tier_alternation() {
    let mut radio = MockRadio::idle();
    let mut samples = SampleQueues::new();
    let mut packetizer = Packetizer::default();

    packetizer
        .build_and_send(&mut radio, &Constant(42.0), &mut samples, at(0))
        .unwrap();
    assert_eq!(&radio.sent[0][..4], &RADIOHEAD_HEADER);
    assert_eq!(radio.sent[0].len(), 4 + 23 * 10);
    assert!(radio.last_text().starts_with("RPM:00042\nP_O:00042\nT_C:00042\nFLT:00042\nP_C:00042\n"));
    assert!(radio.last_text().ends_with("S_4:00042\n"));

    radio.complete();
    packetizer
        .build_and_send(&mut radio, &Constant(42.0), &mut samples, at(100))
        .unwrap();
    assert_eq!(radio.last_text(), "RPM:00042\nP_O:00042\nT_C:00042\nFLT:00042\n");

    radio.complete();
    packetizer
        .build_and_send(&mut radio, &Constant(42.0), &mut samples, at(200))
        .unwrap();
    assert_eq!(radio.sent[2].len(), 4 + 23 * 10);
    assert_eq!(packetizer.packet_counter(), 3);
}

#[test]
/// Packets never exceed the radio limit, whatever that limit is.
fn test_budget_invariant() {
    for max_payload in [4usize, 9, 14, 30, 64, 100, 180, 251, 255, 300] {
        let mut radio = MockRadio::idle();
        radio.max_payload = max_payload;
        let mut samples = SampleQueues::new();
        fill_samples(&mut samples, 32, 32);
        let mut packetizer = Packetizer::default();

        for tick in 0..4u64 {
            packetizer
                .build_and_send(&mut radio, &Constant(7.0), &mut samples, at(tick * 100))
                .unwrap();
            radio.complete();
            let packet = radio.sent.last().unwrap();
            assert!(packet.len() <= max_payload.min(LORA_FIFO_SIZE));
        }
    }
}

#[test]
/// Samples that do not fit stay queued for the next packet.
fn test_samples_left_queued() {
    let mut radio = MockRadio::idle();
    let mut samples = SampleQueues::new();
    fill_samples(&mut samples, 32, 5);
    let mut packetizer = Packetizer::default();

    packetizer
        .build_and_send(&mut radio, &CriticalOnly, &mut samples, at(0))
        .unwrap();

    // 251 bytes after the header: 40 numeric, 7 positions of 28 + '\n',
    // one speed of 10 + '\n'.
    assert_eq!(samples.position.len(), 25);
    assert_eq!(samples.speed.len(), 4);
    let text = radio.last_text();
    assert!(text.contains("GPS:0:44.500000,-123.250000|GPS:0:"));
    assert!(text.ends_with("|\nSPD:0:385|\n"));
    assert_eq!(packetizer.last_packet_len(), 4 + 40 + 7 * 28 + 1 + 10 + 1);

    radio.complete();
    packetizer
        .build_and_send(&mut radio, &CriticalOnly, &mut samples, at(50))
        .unwrap();
    assert!(samples.position.len() < 25);
}

#[test]
/// Sample records carry their age relative to the packet.
fn test_sample_delta() {
    let mut radio = MockRadio::idle();
    let mut samples = SampleQueues::new();
    samples.speed.push(at(100), 385);
    samples.speed.push(at(200), 391);
    let mut packetizer = Packetizer::default();

    packetizer
        .build_and_send(&mut radio, &CriticalOnly, &mut samples, at(220))
        .unwrap();
    assert!(radio.last_text().ends_with("SPD:120:385|SPD:20:391|\n"));
    assert!(samples.speed.is_empty());
}

#[test]
/// A refused transmission keeps samples and the packet counter.
fn test_transmit_failure_keeps_state() {
    let mut radio = MockRadio::idle();
    radio.fail = true;
    let mut samples = SampleQueues::new();
    fill_samples(&mut samples, 2, 2);
    let mut packetizer = Packetizer::default();

    let result = packetizer.build_and_send(&mut radio, &CriticalOnly, &mut samples, at(0));
    assert_eq!(result, Err(RadioError::Transmit("spi timeout")));
    assert_eq!(samples.position.len(), 2);
    assert_eq!(samples.speed.len(), 2);
    assert_eq!(packetizer.packet_counter(), 0);
}

#[test]
/// Out-of-range values drop only their own record.
fn test_rejected_record_skipped() {
    struct Mixed;
    impl TelemetrySource for Mixed {
        fn value(&self, channel: Channel) -> Option<f32> {
            match channel {
                Channel::Rpm => Some(5_000.0),
                Channel::OilPressure => Some(-1.0),
                Channel::CoolantTemp => Some(123_456.0),
                Channel::Fault => Some(0.0),
                _ => None,
            }
        }
    }

    let mut radio = MockRadio::idle();
    let mut packetizer = Packetizer::default();
    packetizer
        .build_and_send(&mut radio, &Mixed, &mut SampleQueues::new(), at(0))
        .unwrap();

    assert_eq!(radio.last_text(), "RPM:05000\nFLT:00000\n");
    assert_eq!(packetizer.rejected_records(), 2);
}

#[test]
/// An unformattable position is dropped and counted; the ones behind it still go out.
fn test_unformattable_sample_does_not_block_ring() {
    let mut packetizer = Packetizer::default();
    let mut radio = MockRadio::idle();
    let mut samples = SampleQueues::new();
    samples.position.push(
        at(0),
        Position {
            latitude: 1e300,
            longitude: 0.0,
        },
    );
    fill_samples(&mut samples, 4, 0);

    let outcome = packetizer.build_and_send(&mut radio, &CriticalOnly, &mut samples, at(0));
    assert_eq!(outcome, Ok(PacketOutcome::Sent));
    assert!(samples.position.is_empty());
    assert_eq!(packetizer.rejected_records(), 1);

    let text = radio.last_text();
    assert_eq!(text.matches("GPS:").count(), 4, "{}", text);
    assert!(text.contains("GPS:0:44.500000,-123.250000|"), "{}", text);
}

#[test]
/// A ring holding only unformattable samples is cleared without writing an empty line.
fn test_only_unformattable_samples() {
    let mut packetizer = Packetizer::default();
    let mut radio = MockRadio::idle();
    let mut samples = SampleQueues::new();
    samples.position.push(
        at(0),
        Position {
            latitude: f64::MAX,
            longitude: f64::MAX,
        },
    );

    let outcome = packetizer.build_and_send(&mut radio, &CriticalOnly, &mut samples, at(0));
    assert_eq!(outcome, Ok(PacketOutcome::Sent));
    assert!(samples.position.is_empty());
    assert_eq!(packetizer.rejected_records(), 1);
    let text = radio.last_text();
    assert!(!text.contains("GPS:"), "{}", text);
    assert!(!text.contains("\n\n"), "{}", text);
}

#[test]
/// A radio whose payload limit is below the header size gets nothing.
fn test_payload_limit_below_header() {
    let mut packetizer = Packetizer::default();
    let mut radio = MockRadio::idle();
    radio.max_payload = RADIOHEAD_HEADER.len() - 1;
    let mut samples = SampleQueues::new();
    fill_samples(&mut samples, 1, 1);

    let outcome = packetizer.build_and_send(&mut radio, &Constant(1.0), &mut samples, at(0));
    assert_eq!(outcome, Ok(PacketOutcome::SkippedUnavailable));
    assert!(radio.sent.is_empty());
    assert_eq!(packetizer.packet_counter(), 0);
    assert_eq!(samples.position.len(), 1);
    assert_eq!(samples.speed.len(), 1);
}
