//! Cooperative replacement for the receive interrupt.
//!
//! On executors without a CAN interrupt, a task awaits the bus, applies the
//! same per-identifier throttle as the interrupt path, and publishes the
//! surviving frames on a bounded channel. The main loop drains that channel
//! without blocking through [`ChannelFrames`].
use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use embassy_time::Instant;

use super::can_frame::CanFrame;
use super::throttle::PendingFrames;
use super::traits::can_bus::{AsyncCanBus, FrameReceiver};

/// Producer half: bus → throttle → channel.
pub struct Forwarder<'a, const N: usize> {
    throttle: PendingFrames,
    sender: Sender<'a, CriticalSectionRawMutex, CanFrame, N>,
    forwarded: u32,
    dropped: u32,
}

impl<'a, const N: usize> Forwarder<'a, N> {
    pub fn new(sender: Sender<'a, CriticalSectionRawMutex, CanFrame, N>) -> Self {
        Self {
            throttle: PendingFrames::new(),
            sender,
            forwarded: 0,
            dropped: 0,
        }
    }

    /// Route one received frame. Identifiers outside the throttled range
    /// (GPS, foreign traffic) go through untouched. Returns `true` if the
    /// frame reached the channel.
    pub fn handle(&mut self, frame: CanFrame, now: Instant) -> bool {
        let id = frame.raw_id();
        let throttled = is_throttled_id(id);
        if throttled && !self.throttle.is_due(id, now) {
            self.dropped = self.dropped.wrapping_add(1);
            return false;
        }

        match self.sender.try_send(frame) {
            Ok(()) => {
                // a frame lost to a full channel must not hold the window
                if throttled {
                    self.throttle.mark_written(id, now);
                }
                self.forwarded = self.forwarded.wrapping_add(1);
                true
            }
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Frame channel full, dropping {=u16:#x}", id);
                self.dropped = self.dropped.wrapping_add(1);
                false
            }
        }
    }

    /// Forward frames until the bus reports an error, then return it.
    pub async fn run<B: AsyncCanBus>(&mut self, bus: &mut B) -> B::Error {
        loop {
            match bus.recv().await {
                Ok(frame) => {
                    self.handle(frame, Instant::now());
                }
                Err(err) => {
                    #[cfg(feature = "defmt")]
                    defmt::error!("CAN receive failed, forwarder stopping");
                    return err;
                }
            }
        }
    }

    /// Frames published on the channel.
    pub fn forwarded(&self) -> u32 {
        self.forwarded
    }

    /// Frames discarded by the throttle or because the channel was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }
}

fn is_throttled_id(id: u16) -> bool {
    (super::PENDING_BASE_ID..=super::PENDING_LAST_ID).contains(&id)
}

/// Consumer half: non-blocking view of the channel for the aggregator.
pub struct ChannelFrames<'a, const N: usize> {
    receiver: Receiver<'a, CriticalSectionRawMutex, CanFrame, N>,
}

impl<'a, const N: usize> ChannelFrames<'a, N> {
    pub fn new(receiver: Receiver<'a, CriticalSectionRawMutex, CanFrame, N>) -> Self {
        Self { receiver }
    }
}

impl<const N: usize> FrameReceiver for ChannelFrames<'_, N> {
    type Error = Infallible;

    fn try_receive(&mut self) -> Result<Option<CanFrame>, Self::Error> {
        Ok(self.receiver.try_receive().ok())
    }
}
