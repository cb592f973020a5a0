//! Cooperative receive path: an async task forwards throttled frames over an
//! embassy channel that the aggregator drains without blocking.
mod helpers {
    include!("helpers/mod.rs");
}

use dashlink::protocol::{
    aggregator::Aggregator,
    messages::{gps_payloads, GpsFix},
    transport::{
        can_frame::CanFrame,
        forwarder::{ChannelFrames, Forwarder},
    },
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::Instant;
use helpers::MockCanBus;
use static_cell::StaticCell;

type FrameChannel = Channel<CriticalSectionRawMutex, CanFrame, 8>;

fn rpm_frame(rpm: u16) -> CanFrame {
    let [lo, hi] = rpm.to_le_bytes();
    CanFrame::new(513, &[lo, hi, 0, 0, 0, 0, 0, 0]).unwrap()
}

#[tokio::test]
/// A burst of one identifier collapses to its first copy; GPS frames are never throttled.
async fn test_forwarder_feeds_aggregator() {
    static CHANNEL: StaticCell<FrameChannel> = StaticCell::new();
    let channel: &'static FrameChannel = CHANNEL.init(Channel::new());

    let (mut dut_bus, host_bus) = MockCanBus::create_pair();
    host_bus.inject(rpm_frame(1000)).unwrap();
    host_bus.inject(rpm_frame(2000)).unwrap();
    host_bus.inject(rpm_frame(3000)).unwrap();
    let fix = GpsFix {
        latitude: 10.0,
        longitude: 20.0,
        speed_mph: 5.0,
    };
    for (id, payload) in gps_payloads(&fix) {
        host_bus.inject(CanFrame::new(id, &payload).unwrap()).unwrap();
    }
    // Closing the host side ends the forwarder once the backlog is read.
    drop(host_bus);

    let task = tokio::spawn(async move {
        let mut forwarder = Forwarder::new(channel.sender());
        let err = forwarder.run(&mut dut_bus).await;
        (err, forwarder.forwarded(), forwarder.dropped())
    });
    let ((), forwarded, dropped) = task.await.unwrap();
    assert_eq!(forwarded, 4);
    assert_eq!(dropped, 2);

    let mut frames = ChannelFrames::new(channel.receiver());
    let mut aggregator = Aggregator::default();
    assert!(aggregator.update(&mut frames, Instant::from_millis(0)));
    assert_eq!(aggregator.state().rpm, 1000);
    assert_eq!(aggregator.state().link.message_count, forwarded);
    assert_eq!(aggregator.samples_mut().position.len(), 1);
    assert_eq!(aggregator.samples_mut().speed.len(), 1);
}

#[tokio::test]
/// Frames beyond the channel capacity are dropped and counted.
async fn test_forwarder_channel_full() {
    static CHANNEL: StaticCell<Channel<CriticalSectionRawMutex, CanFrame, 2>> = StaticCell::new();
    let channel = CHANNEL.init(Channel::new());
    let mut forwarder = Forwarder::new(channel.sender());

    let now = Instant::from_millis(0);
    for (id, payload) in gps_payloads(&GpsFix {
        latitude: 1.0,
        longitude: 2.0,
        speed_mph: 3.0,
    }) {
        forwarder.handle(CanFrame::new(id, &payload).unwrap(), now);
    }
    assert_eq!(forwarder.forwarded(), 2);
    assert_eq!(forwarder.dropped(), 1);
    assert_eq!(channel.len(), 2);
}
