//! Synthetic ECU broadcast for bench testing without an engine.
//!
//! Every signal of `BASE0`..`BASE7` sweeps over its documented range with a
//! common period. Values follow a triangle wave starting at the range
//! minimum; status bits are off during the first half of each period and on
//! during the second. Frames are encoded through the schema engine, so a
//! dashboard fed by the generator exercises the same decode path as one fed
//! by the car.
use embassy_time::{Duration, Instant};

use crate::core::Signal;
use crate::error::{EncodeError, SendError};
use crate::infra::codec::{engine, traits::SignalAccess};
use crate::protocol::messages::{lookup, ECU_BROADCAST_IDS};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::can_bus::FrameTransmitter;

/// Period shared by every swept value (ms).
pub const SWEEP_PERIOD_MS: u64 = 5000;

/// Physical range swept by each non-flag signal.
static SWEEP_RANGES: [(Signal, f32, f32); 33] = [
    (Signal::WarningCounter, 0.0, 65535.0),
    (Signal::LastError, 0.0, 65535.0),
    (Signal::CurrentGear, 0.0, 8.0),
    (Signal::DistanceTraveled, 0.0, 6553.5),
    (Signal::Rpm, 0.0, 8000.0),
    (Signal::IgnitionTiming, -50.0, 50.0),
    (Signal::InjectorDuty, 0.0, 100.0),
    (Signal::IgnitionDuty, 0.0, 100.0),
    (Signal::VehicleSpeed, 0.0, 255.0),
    (Signal::FlexPct, 0.0, 100.0),
    (Signal::ManifoldPressure, 0.0, 300.0),
    (Signal::CoolantTemp, -40.0, 200.0),
    (Signal::IntakeTemp, -40.0, 200.0),
    (Signal::Aux1Temp, -40.0, 200.0),
    (Signal::Aux2Temp, -40.0, 200.0),
    (Signal::McuTemp, -40.0, 100.0),
    (Signal::FuelLevel, 0.0, 100.0),
    (Signal::OilPressure, 0.0, 1000.0),
    (Signal::OilTemp, -40.0, 215.0),
    (Signal::FuelTemp, -40.0, 215.0),
    (Signal::BatteryVoltage, 0.0, 25.0),
    (Signal::CylinderAirMass, 0.0, 1000.0),
    (Signal::EstimatedMaf, 0.0, 500.0),
    (Signal::InjectorPulseWidth, 0.0, 20.0),
    (Signal::KnockCount, 0.0, 1000.0),
    (Signal::FuelUsed, 0.0, 65535.0),
    (Signal::FuelFlow, 0.0, 327.0),
    (Signal::FuelTrim1, -50.0, 50.0),
    (Signal::FuelTrim2, -50.0, 50.0),
    (Signal::Lambda1, 0.7, 1.3),
    (Signal::Lambda2, 0.7, 1.3),
    (Signal::FuelPressureLow, 0.0, 1000.0),
    (Signal::FuelPressureHigh, 0.0, 100.0),
];

const fn is_status_bit(signal: Signal) -> bool {
    matches!(
        signal,
        Signal::RevLimiterActive
            | Signal::MainRelayActive
            | Signal::FuelPumpActive
            | Signal::CheckEngineActive
            | Signal::EgoHeaterActive
            | Signal::LambdaProtectActive
            | Signal::FanActive
            | Signal::Fan2Active
    )
}

/// Snapshot of every swept value at one point of the period.
///
/// Read-only [`SignalAccess`] implementor handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSample {
    /// Position inside the period, `0..SWEEP_PERIOD_MS`.
    phase_ms: u64,
}

impl SweepSample {
    pub fn at_phase(elapsed_ms: u64) -> Self {
        Self {
            phase_ms: elapsed_ms % SWEEP_PERIOD_MS,
        }
    }

    pub fn phase_ms(&self) -> u64 {
        self.phase_ms
    }

    /// Triangle position: 0.0 at phase 0, 1.0 at half-period, back to 0.0.
    fn position(&self) -> f32 {
        let half = SWEEP_PERIOD_MS / 2;
        let rising = if self.phase_ms <= half {
            self.phase_ms
        } else {
            SWEEP_PERIOD_MS - self.phase_ms
        };
        rising as f32 / half as f32
    }

    fn status_bit(&self) -> bool {
        self.phase_ms > SWEEP_PERIOD_MS / 2
    }
}

impl SignalAccess for SweepSample {
    fn signal(&self, signal: Signal) -> Option<f32> {
        if is_status_bit(signal) {
            return Some(if self.status_bit() { 1.0 } else { 0.0 });
        }
        let (_, min, max) = SWEEP_RANGES.iter().find(|(s, _, _)| *s == signal)?;
        Some(min + (max - min) * self.position())
    }

    fn set_signal(&mut self, _signal: Signal, _value: f32) -> Option<()> {
        None
    }
}

/// Emits the whole ECU broadcast once per call to [`SweepGenerator::emit`].
#[derive(Debug)]
pub struct SweepGenerator {
    origin: Instant,
    frames_sent: u32,
    busy_skips: u32,
}

impl SweepGenerator {
    /// Sweep starts at range minimum at `origin`.
    pub fn new(origin: Instant) -> Self {
        Self {
            origin,
            frames_sent: 0,
            busy_skips: 0,
        }
    }

    /// Frames accepted by the transmitter so far.
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Frames dropped because every transmit buffer was occupied.
    pub fn busy_skips(&self) -> u32 {
        self.busy_skips
    }

    pub fn sample(&self, now: Instant) -> SweepSample {
        let elapsed = now
            .checked_duration_since(self.origin)
            .unwrap_or(Duration::from_ticks(0));
        SweepSample::at_phase(elapsed.as_millis())
    }

    /// Encode broadcast frame `id` with the values of `now`.
    pub fn frame(&self, id: u16, now: Instant) -> Result<CanFrame, EncodeError> {
        let schema = lookup(id).ok_or(EncodeError::UnknownIdentifier { id })?;
        let mut payload = [0u8; 8];
        let len = engine::encode_from(&self.sample(now), &mut payload, schema)?;
        CanFrame::new(id, &payload[..len]).ok_or(EncodeError::UnknownIdentifier { id })
    }

    /// Encode and transmit `512`, `513` and `515`..`519`, in identifier order.
    ///
    /// A busy transmitter drops the frame and moves on to the next one;
    /// the following call sends fresh values anyway. Returns the number of
    /// frames accepted. A controller failure aborts the round.
    pub fn emit<T: FrameTransmitter>(
        &mut self,
        bus: &mut T,
        now: Instant,
    ) -> Result<usize, SendError<T::Error>> {
        let mut sent = 0;
        for id in ECU_BROADCAST_IDS {
            let frame = match self.frame(id, now) {
                Ok(frame) => frame,
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Generator could not encode {=u16}: {}", id, defmt::Display2Format(&_err));
                    continue;
                }
            };

            match bus.try_send(&frame) {
                Ok(()) => {
                    self.frames_sent = self.frames_sent.wrapping_add(1);
                    sent += 1;
                }
                Err(SendError::Busy) => {
                    self.busy_skips = self.busy_skips.wrapping_add(1);
                    #[cfg(feature = "defmt")]
                    defmt::debug!("CAN TX busy, frame {=u16} skipped", id);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(sent)
    }
}
