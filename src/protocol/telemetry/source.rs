//! Wire values for each telemetry channel.
//!
//! Values are returned already scaled to the unit the pit-wall receiver
//! expects (see [`Dashboard`]); the packetizer only rounds and range-checks.
use super::channels::Channel;
use crate::protocol::state::EngineState;

/// Anything able to report telemetry channels.
pub trait TelemetrySource {
    /// Wire value of `channel`, or `None` when this source does not produce
    /// it (the record is then left out of the packet).
    fn value(&self, channel: Channel) -> Option<f32>;
}

/// Readings sampled by the dashboard itself rather than received from the ECU.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExternalReadings {
    /// Analog coolant pressure sender, psi.
    pub coolant_pressure_psi: Option<f32>,
    /// Tank level from the fuel sender, percent.
    pub fuel_level_pct: Option<f32>,
    /// Sump thermistor, °C. Preferred over the ECU value when present.
    pub oil_temp_c: Option<f32>,
    /// Mission elapsed time, seconds.
    pub mission_elapsed_s: Option<u32>,
}

const PSI_PER_KPA: f32 = 0.145_037_7;

/// Fault digits: check engine in the units, rev limiter in the tens,
/// lambda protection in the hundreds.
fn fault_code(state: &EngineState) -> u16 {
    let status = &state.status;
    status.check_engine as u16 + 10 * status.rev_limiter as u16 + 100 * status.lambda_protect as u16
}

/// Engine state plus the dashboard's own sensors, as one telemetry source.
///
/// | id  | wire value |
/// |-----|------------|
/// | RPM | rpm |
/// | T_C, T_O, P_C | tenths of °C / psi |
/// | P_O | psi |
/// | VBA | millivolts |
/// | O_2 | lambda × 1000 |
/// | FLT | fault digits |
/// | S_E | status bits |
/// | FAN | 50 per running fan |
pub struct Dashboard<'a> {
    pub engine: &'a EngineState,
    pub external: &'a ExternalReadings,
}

impl<'a> Dashboard<'a> {
    pub fn new(engine: &'a EngineState, external: &'a ExternalReadings) -> Self {
        Self { engine, external }
    }
}

impl TelemetrySource for Dashboard<'_> {
    fn value(&self, channel: Channel) -> Option<f32> {
        let engine = self.engine;
        let value = match channel {
            Channel::Rpm => engine.rpm as f32,
            Channel::CoolantTemp => engine.coolant_temp as f32 * 10.0,
            Channel::CoolantPressure => self.external.coolant_pressure_psi? * 10.0,
            Channel::OilTemp => {
                self.external
                    .oil_temp_c
                    .unwrap_or(engine.oil_temp as f32)
                    * 10.0
            }
            Channel::OilPressure => engine.oil_pressure_kpa * PSI_PER_KPA,
            Channel::BatteryVoltage => engine.battery_voltage * 1000.0,
            Channel::MissionElapsed => self.external.mission_elapsed_s? as f32,
            Channel::Fault => fault_code(engine) as f32,
            Channel::FuelLevel => self
                .external
                .fuel_level_pct
                .unwrap_or(engine.fuel_level_pct),
            Channel::EngineStatus => engine.status.bits() as f32,
            Channel::Advance => engine.ignition_timing,
            Channel::Oxygen => engine.lambda1 * 1000.0,
            Channel::IntakeTemp => engine.intake_temp as f32,
            Channel::ManifoldPressure => engine.map_kpa,
            Channel::FanDuty => {
                50.0 * (engine.status.fan as u8 + engine.status.fan2 as u8) as f32
            }
            Channel::WarningCounter => engine.warning_counter as f32,
            Channel::LastError => engine.last_error as f32,
            Channel::KnockCount => engine.knock_count as f32,
            // not broadcast by this ECU
            Channel::SyncLoss
            | Channel::VolumetricEfficiency
            | Channel::AfrTarget
            | Channel::Throttle
            | Channel::ProtectStatus => return None,
        };
        Some(value)
    }
}
