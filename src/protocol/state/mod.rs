//! Canonical engine-state snapshot.
//!
//! Created once with default values, mutated only by the aggregator, read by
//! the packetizer and the renderer on the same thread.
use embassy_time::Instant;
use heapless::Vec;

use crate::core::Signal;
use crate::infra::codec::traits::SignalAccess;

/// Longest status text carried by one 508 frame.
pub const STATUS_TEXT_CAPACITY: usize = 8;

//==================================================================================LINK
/// Coarse link state exposed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// No valid frame decoded yet.
    #[default]
    NoConnection,
    /// Frames are being decoded.
    HasData,
}

/// Outcome of the last transport poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusStatus {
    #[default]
    Ok,
    /// The controller had nothing to deliver.
    NoMessage,
    /// The controller reported an error.
    Fault,
}

/// Link-health bookkeeping. Staleness is expressed through
/// `missed_message_count`, not through a separate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkHealth {
    pub state: LinkState,
    /// Liveness windows elapsed without a decoded frame, reset on decode.
    pub missed_message_count: u16,
    /// Frames decoded since start-up.
    pub message_count: u32,
    pub bus_status: BusStatus,
    /// Transport errors since start-up.
    pub transport_errors: u32,
}

impl LinkHealth {
    /// `true` once more than `threshold` consecutive windows were missed.
    pub fn is_link_down(&self, threshold: u16) -> bool {
        self.state == LinkState::NoConnection || self.missed_message_count > threshold
    }
}

//==================================================================================STATUS
/// The eight status bits of `BASE0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags {
    pub rev_limiter: bool,
    pub main_relay: bool,
    pub fuel_pump: bool,
    pub check_engine: bool,
    pub ego_heater: bool,
    pub lambda_protect: bool,
    pub fan: bool,
    pub fan2: bool,
}

impl StatusFlags {
    /// Flags packed in broadcast order, rev limiter in bit 0.
    pub fn bits(&self) -> u8 {
        [
            self.rev_limiter,
            self.main_relay,
            self.fuel_pump,
            self.check_engine,
            self.ego_heater,
            self.lambda_protect,
            self.fan,
            self.fan2,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (bit, &set)| acc | ((set as u8) << bit))
    }

    fn flag_mut(&mut self, signal: Signal) -> Option<&mut bool> {
        Some(match signal {
            Signal::RevLimiterActive => &mut self.rev_limiter,
            Signal::MainRelayActive => &mut self.main_relay,
            Signal::FuelPumpActive => &mut self.fuel_pump,
            Signal::CheckEngineActive => &mut self.check_engine,
            Signal::EgoHeaterActive => &mut self.ego_heater,
            Signal::LambdaProtectActive => &mut self.lambda_protect,
            Signal::FanActive => &mut self.fan,
            Signal::Fan2Active => &mut self.fan2,
            _ => return None,
        })
    }

    fn flag(&self, signal: Signal) -> Option<bool> {
        Some(match signal {
            Signal::RevLimiterActive => self.rev_limiter,
            Signal::MainRelayActive => self.main_relay,
            Signal::FuelPumpActive => self.fuel_pump,
            Signal::CheckEngineActive => self.check_engine,
            Signal::EgoHeaterActive => self.ego_heater,
            Signal::LambdaProtectActive => self.lambda_protect,
            Signal::FanActive => self.fan,
            Signal::Fan2Active => self.fan2,
            _ => return None,
        })
    }
}

/// Text pushed by the ECU on identifier 508.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// Bytes up to the first NUL, at most one payload.
    pub text: Vec<u8, STATUS_TEXT_CAPACITY>,
    /// Decode instant, for display timeouts.
    pub appeared_at: Instant,
}

impl StatusMessage {
    /// Copy at most `payload.len()` bytes, stopping at the first NUL.
    pub fn from_payload(payload: &[u8], appeared_at: Instant) -> Self {
        let end = payload
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(payload.len())
            .min(STATUS_TEXT_CAPACITY);
        let mut text = Vec::new();
        // bounded by STATUS_TEXT_CAPACITY above
        let _ = text.extend_from_slice(&payload[..end]);
        Self { text, appeared_at }
    }

    /// Text as UTF-8, `None` if the ECU sent something else.
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.text).ok()
    }
}

//==================================================================================ENGINE_STATE
/// Physical values of every broadcast signal plus link health.
///
/// Units follow the broadcast: temperatures in °C, pressures in kPa (fuel
/// high side in bar), voltage in V, lambda dimensionless.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineState {
    // 512
    pub warning_counter: u16,
    pub last_error: u16,
    pub status: StatusFlags,
    pub current_gear: u8,
    pub distance_km: f32,
    // 513
    pub rpm: u16,
    pub ignition_timing: f32,
    pub injector_duty: f32,
    pub ignition_duty: f32,
    pub vehicle_speed_kph: u8,
    pub flex_pct: u8,
    // 515
    pub map_kpa: f32,
    pub coolant_temp: i16,
    pub intake_temp: i16,
    pub aux1_temp: i16,
    pub aux2_temp: i16,
    pub mcu_temp: i16,
    pub fuel_level_pct: f32,
    // 516
    pub oil_pressure_kpa: f32,
    pub oil_temp: i16,
    pub fuel_temp: i16,
    pub battery_voltage: f32,
    // 517
    pub cylinder_air_mass: u16,
    pub estimated_maf: f32,
    pub injector_pulse_width: f32,
    pub knock_count: u16,
    // 518
    pub fuel_used_g: u16,
    pub fuel_flow: f32,
    pub fuel_trim1: f32,
    pub fuel_trim2: f32,
    // 519
    pub lambda1: f32,
    pub lambda2: f32,
    pub fuel_pressure_low_kpa: f32,
    pub fuel_pressure_high_bar: f32,
    // 420
    pub dash_fuel_level: u8,

    pub status_message: Option<StatusMessage>,
    pub link: LinkHealth,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalAccess for EngineState {
    fn signal(&self, signal: Signal) -> Option<f32> {
        if let Some(flag) = self.status.flag(signal) {
            return Some(if flag { 1.0 } else { 0.0 });
        }

        let value = match signal {
            Signal::WarningCounter => self.warning_counter as f32,
            Signal::LastError => self.last_error as f32,
            Signal::CurrentGear => self.current_gear as f32,
            Signal::DistanceTraveled => self.distance_km,
            Signal::Rpm => self.rpm as f32,
            Signal::IgnitionTiming => self.ignition_timing,
            Signal::InjectorDuty => self.injector_duty,
            Signal::IgnitionDuty => self.ignition_duty,
            Signal::VehicleSpeed => self.vehicle_speed_kph as f32,
            Signal::FlexPct => self.flex_pct as f32,
            Signal::ManifoldPressure => self.map_kpa,
            Signal::CoolantTemp => self.coolant_temp as f32,
            Signal::IntakeTemp => self.intake_temp as f32,
            Signal::Aux1Temp => self.aux1_temp as f32,
            Signal::Aux2Temp => self.aux2_temp as f32,
            Signal::McuTemp => self.mcu_temp as f32,
            Signal::FuelLevel => self.fuel_level_pct,
            Signal::OilPressure => self.oil_pressure_kpa,
            Signal::OilTemp => self.oil_temp as f32,
            Signal::FuelTemp => self.fuel_temp as f32,
            Signal::BatteryVoltage => self.battery_voltage,
            Signal::CylinderAirMass => self.cylinder_air_mass as f32,
            Signal::EstimatedMaf => self.estimated_maf,
            Signal::InjectorPulseWidth => self.injector_pulse_width,
            Signal::KnockCount => self.knock_count as f32,
            Signal::FuelUsed => self.fuel_used_g as f32,
            Signal::FuelFlow => self.fuel_flow,
            Signal::FuelTrim1 => self.fuel_trim1,
            Signal::FuelTrim2 => self.fuel_trim2,
            Signal::Lambda1 => self.lambda1,
            Signal::Lambda2 => self.lambda2,
            Signal::FuelPressureLow => self.fuel_pressure_low_kpa,
            Signal::FuelPressureHigh => self.fuel_pressure_high_bar,
            Signal::DashFuelLevel => self.dash_fuel_level as f32,
            _ => return None,
        };
        Some(value)
    }

    fn set_signal(&mut self, signal: Signal, value: f32) -> Option<()> {
        if let Some(flag) = self.status.flag_mut(signal) {
            *flag = value != 0.0;
            return Some(());
        }

        // `as` saturates; the schema ranges fit every field anyway
        match signal {
            Signal::WarningCounter => self.warning_counter = value as u16,
            Signal::LastError => self.last_error = value as u16,
            Signal::CurrentGear => self.current_gear = value as u8,
            Signal::DistanceTraveled => self.distance_km = value,
            Signal::Rpm => self.rpm = value as u16,
            Signal::IgnitionTiming => self.ignition_timing = value,
            Signal::InjectorDuty => self.injector_duty = value,
            Signal::IgnitionDuty => self.ignition_duty = value,
            Signal::VehicleSpeed => self.vehicle_speed_kph = value as u8,
            Signal::FlexPct => self.flex_pct = value as u8,
            Signal::ManifoldPressure => self.map_kpa = value,
            Signal::CoolantTemp => self.coolant_temp = value as i16,
            Signal::IntakeTemp => self.intake_temp = value as i16,
            Signal::Aux1Temp => self.aux1_temp = value as i16,
            Signal::Aux2Temp => self.aux2_temp = value as i16,
            Signal::McuTemp => self.mcu_temp = value as i16,
            Signal::FuelLevel => self.fuel_level_pct = value,
            Signal::OilPressure => self.oil_pressure_kpa = value,
            Signal::OilTemp => self.oil_temp = value as i16,
            Signal::FuelTemp => self.fuel_temp = value as i16,
            Signal::BatteryVoltage => self.battery_voltage = value,
            Signal::CylinderAirMass => self.cylinder_air_mass = value as u16,
            Signal::EstimatedMaf => self.estimated_maf = value,
            Signal::InjectorPulseWidth => self.injector_pulse_width = value,
            Signal::KnockCount => self.knock_count = value as u16,
            Signal::FuelUsed => self.fuel_used_g = value as u16,
            Signal::FuelFlow => self.fuel_flow = value,
            Signal::FuelTrim1 => self.fuel_trim1 = value,
            Signal::FuelTrim2 => self.fuel_trim2 = value,
            Signal::Lambda1 => self.lambda1 = value,
            Signal::Lambda2 => self.lambda2 = value,
            Signal::FuelPressureLow => self.fuel_pressure_low_kpa = value,
            Signal::FuelPressureHigh => self.fuel_pressure_high_bar = value,
            Signal::DashFuelLevel => self.dash_fuel_level = value as u8,
            _ => return None,
        }
        Some(())
    }
}
