//! State aggregator: drains received frames into the engine-state snapshot
//! and keeps link health.
//!
//! ## Link states
//!
//! * `NoConnection` until the first frame is decoded.
//! * `HasData` afterwards. Staleness is not a separate state: every liveness
//!   window that passes without a decoded frame increments
//!   `missed_message_count` once, and the renderer compares it with
//!   `link_down_after_misses`.
//!
//! Transport errors are recorded in the link health and never stop an update.
use embassy_time::{Duration, Instant};

use crate::core::{GpsAxis, PayloadKind};
use crate::error::DecodeSkipped;
use crate::infra::codec::engine;
use crate::protocol::messages::{self, gps_value};
use crate::protocol::state::{BusStatus, EngineState, LinkState, StatusMessage};
use crate::protocol::telemetry::samples::{Position, SampleQueues};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::throttle::SharedPendingFrames;
use crate::protocol::transport::traits::can_bus::FrameReceiver;
use crate::protocol::transport::{
    LINK_DOWN_AFTER_MISSES, LIVENESS_WINDOW_MS, MAX_FRAMES_PER_UPDATE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AggregatorConfig {
    /// Silence counted as one missed window.
    pub liveness_window: Duration,
    /// Misses after which the link should be shown as down.
    pub link_down_after_misses: u16,
    /// Frames drained per update at most.
    pub max_frames_per_update: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            liveness_window: Duration::from_millis(LIVENESS_WINDOW_MS),
            link_down_after_misses: LINK_DOWN_AFTER_MISSES,
            max_frames_per_update: MAX_FRAMES_PER_UPDATE,
        }
    }
}

pub struct Aggregator {
    state: EngineState,
    samples: SampleQueues,
    config: AggregatorConfig,
    /// Latitude waiting for its longitude frame.
    pending_latitude: Option<f64>,
    /// Start of the current liveness window; `None` until the first update.
    window_start: Option<Instant>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Self {
        Self {
            state: EngineState::new(),
            samples: SampleQueues::new(),
            config,
            pending_latitude: None,
            window_start: None,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn samples_mut(&mut self) -> &mut SampleQueues {
        &mut self.samples
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Borrow the snapshot and the sample rings at once, as the packetizer needs.
    pub fn split(&mut self) -> (&EngineState, &mut SampleQueues) {
        (&self.state, &mut self.samples)
    }

    /// Renderer-side policy helper.
    pub fn is_link_down(&self) -> bool {
        self.state
            .link
            .is_link_down(self.config.link_down_after_misses)
    }

    /// Drain up to `max_frames_per_update` frames from `source` and apply
    /// them. Returns `true` when the consumer should redraw: a frame was
    /// decoded or a liveness window was missed.
    pub fn update<R: FrameReceiver>(&mut self, source: &mut R, now: Instant) -> bool {
        let mut decoded = false;

        for _ in 0..self.config.max_frames_per_update {
            match source.try_receive() {
                Ok(Some(frame)) => {
                    self.state.link.bus_status = BusStatus::Ok;
                    decoded |= self.apply_logged(&frame, now);
                }
                Ok(None) => {
                    self.state.link.bus_status = BusStatus::NoMessage;
                    break;
                }
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("CAN receive error: {}", defmt::Debug2Format(&_err));
                    self.state.link.bus_status = BusStatus::Fault;
                    self.state.link.transport_errors =
                        self.state.link.transport_errors.wrapping_add(1);
                    break;
                }
            }
        }

        self.finish_cycle(decoded, now)
    }

    /// Consume the interrupt-filled pending buffer in one critical section,
    /// then apply the frames outside it.
    ///
    /// The whole batch is applied: it is already bounded by the buffer's
    /// slot count, and frames left unapplied here would be lost.
    pub fn update_from_pending(&mut self, pending: &SharedPendingFrames, now: Instant) -> bool {
        let batch = pending.take_all();
        self.state.link.bus_status = if batch.is_empty() {
            BusStatus::NoMessage
        } else {
            BusStatus::Ok
        };

        let mut decoded = false;
        for frame in &batch {
            decoded |= self.apply_logged(frame, now);
        }
        self.finish_cycle(decoded, now)
    }

    /// Apply a single frame. Unknown, empty and short frames are refused
    /// without touching the state.
    pub fn apply(&mut self, frame: &CanFrame, now: Instant) -> Result<(), DecodeSkipped> {
        let payload = frame.payload();
        if payload.is_empty() {
            return Err(DecodeSkipped::EmptyFrame);
        }
        let schema = messages::lookup(frame.raw_id())
            .ok_or(DecodeSkipped::UnknownIdentifier { id: frame.raw_id() })?;

        match schema.payload {
            PayloadKind::Signals(_) => engine::decode_into(&mut self.state, payload, schema),
            PayloadKind::Text => {
                self.state.status_message = Some(StatusMessage::from_payload(payload, now));
                Ok(())
            }
            PayloadKind::Gps(axis) => {
                let value = gps_value(payload).ok_or(DecodeSkipped::PayloadTooShort {
                    needed: 8,
                    available: payload.len(),
                })?;
                self.apply_gps(frame.raw_id(), axis, value, now)
            }
        }
    }

    fn apply_logged(&mut self, frame: &CanFrame, now: Instant) -> bool {
        match self.apply(frame, now) {
            Ok(()) => {
                self.state.link.message_count = self.state.link.message_count.wrapping_add(1);
                true
            }
            Err(_skipped) => {
                #[cfg(feature = "defmt")]
                defmt::trace!("Frame {=u16:#x} skipped: {}", frame.raw_id(), defmt::Display2Format(&_skipped));
                false
            }
        }
    }

    /// Coordinates outside the WGS84 range are refused and break the
    /// latitude/longitude pairing, so a bad half never reaches the queue.
    fn apply_gps(
        &mut self,
        id: u16,
        axis: GpsAxis,
        value: f64,
        now: Instant,
    ) -> Result<(), DecodeSkipped> {
        let limit = match axis {
            GpsAxis::Latitude => Some(90.0),
            GpsAxis::Longitude => Some(180.0),
            GpsAxis::SpeedMph => None,
        };
        if let Some(limit) = limit {
            // NaN and infinities fall outside the range too
            if !(-limit..=limit).contains(&value) {
                self.pending_latitude = None;
                #[cfg(feature = "defmt")]
                defmt::warn!("GPS frame {=u16:#x} out of range, pair dropped", id);
                return Err(DecodeSkipped::InvalidCoordinate { id });
            }
        }

        match axis {
            GpsAxis::Latitude => self.pending_latitude = Some(value),
            GpsAxis::Longitude => {
                if let Some(latitude) = self.pending_latitude.take() {
                    self.samples.position.push(
                        now,
                        Position {
                            latitude,
                            longitude: value,
                        },
                    );
                }
            }
            GpsAxis::SpeedMph => {
                let tenths = if value.is_finite() && value > 0.0 {
                    (value * 10.0 + 0.5) as u16
                } else {
                    0
                };
                self.samples.speed.push(now, tenths);
            }
        }
        Ok(())
    }

    fn finish_cycle(&mut self, decoded: bool, now: Instant) -> bool {
        let link = &mut self.state.link;

        if decoded {
            link.missed_message_count = 0;
            link.state = LinkState::HasData;
            self.window_start = Some(now);
            return true;
        }

        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return false;
        };

        if now.saturating_duration_since(start) >= self.config.liveness_window {
            // re-arm: the next miss needs a full window of its own
            self.window_start = Some(now);
            link.missed_message_count = link.missed_message_count.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::warn!("No CAN data for a liveness window, missed={}", link.missed_message_count);
            return true;
        }

        false
    }
}
