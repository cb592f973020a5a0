//! End-to-end scenario: the sweep generator feeds the bus, the aggregator
//! builds the engine state, the packetizer sends one LoRa packet, and the
//! base station frames it for the serial link.
mod helpers {
    include!("helpers/mod.rs");
}

use dashlink::infra::framing::{self, max_encoded_len, Framing};
use dashlink::protocol::{
    aggregator::Aggregator,
    generator::SweepGenerator,
    messages::{gps_payloads, GpsFix},
    state::LinkState,
    telemetry::{
        packetizer::{PacketOutcome, Packetizer},
        source::{Dashboard, ExternalReadings},
    },
    transport::{can_frame::CanFrame, throttle::SharedPendingFrames, LORA_FIFO_SIZE, RADIOHEAD_HEADER},
};
use embassy_time::Instant;
use helpers::{LoopbackBus, MockRadio};

fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

fn push_fix(bus: &mut LoopbackBus, fix: &GpsFix) {
    for (id, payload) in gps_payloads(fix) {
        bus.frames.push_back(CanFrame::new(id, &payload).unwrap());
    }
}

#[test]
/// Generator → aggregator → packetizer → serial framing, with GPS samples.
fn test_generator_to_serial_link() {
    let mut generator = SweepGenerator::new(at(0));
    let mut bus = LoopbackBus::default();
    let mut aggregator = Aggregator::default();
    let mut packetizer = Packetizer::default();
    let mut radio = MockRadio::idle();
    let external = ExternalReadings::default();

    assert_eq!(generator.emit(&mut bus, at(3000)), Ok(7));
    push_fix(
        &mut bus,
        &GpsFix {
            latitude: 44.5,
            longitude: -123.25,
            speed_mph: 38.5,
        },
    );

    assert!(aggregator.update(&mut bus, at(3000)));
    assert!(bus.frames.is_empty());
    assert_eq!(aggregator.state().link.state, LinkState::HasData);
    assert_eq!(aggregator.state().link.message_count, 10);
    assert_eq!(aggregator.state().rpm, 6400);

    let (engine, samples) = aggregator.split();
    let dashboard = Dashboard::new(engine, &external);
    let outcome = packetizer.build_and_send(&mut radio, &dashboard, samples, at(3000));
    assert_eq!(outcome, Ok(PacketOutcome::Sent));
    assert!(samples.position.is_empty());
    assert!(samples.speed.is_empty());

    let packet = radio.sent.last().unwrap().clone();
    assert_eq!(packet[..4], RADIOHEAD_HEADER);
    let text = std::str::from_utf8(&packet[4..]).unwrap();
    assert!(text.starts_with("RPM:06400\n"), "{}", text);
    assert!(text.contains("T_C:01520\n"), "{}", text);
    assert!(text.contains("FLT:00111\n"), "{}", text);
    assert!(text.contains("GPS:0:44.500000,-123.250000|\n"), "{}", text);
    assert!(text.ends_with("SPD:0:385|\n"), "{}", text);

    let mut serial = [0u8; max_encoded_len(LORA_FIFO_SIZE)];
    let encoded = framing::encode(&packet, &mut serial, Framing::RelayCompatible).unwrap();
    assert_eq!(serial[encoded - 1], 0x00);

    let decoded = framing::decode(&mut serial[..encoded], Framing::RelayCompatible).unwrap();
    assert_eq!(&serial[..decoded], packet.as_slice());
}

#[test]
/// Nothing on the bus for three windows marks the link down; one frame revives it.
fn test_link_loss_and_recovery() {
    let generator = SweepGenerator::new(at(0));
    let mut bus = LoopbackBus::default();
    let mut aggregator = Aggregator::default();

    bus.frames.push_back(generator.frame(513, at(0)).unwrap());
    assert!(aggregator.update(&mut bus, at(0)));
    assert!(!aggregator.is_link_down());

    for second in 1..=4 {
        aggregator.update(&mut bus, at(second * 1000 + 1));
    }
    assert!(aggregator.is_link_down());

    bus.frames.push_back(generator.frame(513, at(5000)).unwrap());
    assert!(aggregator.update(&mut bus, at(5000)));
    assert!(!aggregator.is_link_down());
    assert_eq!(aggregator.state().link.missed_message_count, 0);
}

static PENDING: SharedPendingFrames = SharedPendingFrames::new();

#[test]
/// Interrupt path: bursts are thinned by the throttle before the aggregator sees them.
fn test_interrupt_path_throttles_bursts() {
    let generator = SweepGenerator::new(at(0));
    let mut aggregator = Aggregator::default();

    // 513 arrives every 2 ms; only the 0 ms and 10 ms copies are kept.
    let mut accepted = 0;
    for ms in (0..=10).step_by(2) {
        let frame = generator.frame(513, at(ms)).unwrap();
        if PENDING.on_frame_arrived(frame, at(ms)) {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 2);
    assert_eq!(PENDING.throttled(), 4);

    assert!(aggregator.update_from_pending(&PENDING, at(12)));
    // 10 ms into the sweep: 8000 * 10 / 2500
    assert_eq!(aggregator.state().rpm, 32);
    assert!(PENDING.take_all().is_empty());
}
