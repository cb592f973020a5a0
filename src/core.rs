//! Defines the "data contract" between the static frame schemas
//! (`protocol::messages`) and the schema engine (`infra::codec::engine`).
//!
//! A schema says where each signal lives inside an eight-byte CAN payload and
//! how its raw integer maps to a physical value (`raw × scale + offset`).
//! The engine interprets those descriptors; it never knows a message by name.

/// Every physical quantity carried by the ECU broadcast.
///
/// Used as the key through which the engine reads and writes a target
/// structure (see [`crate::infra::codec::traits::SignalAccess`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    // 512 BASE0
    WarningCounter,
    LastError,
    RevLimiterActive,
    MainRelayActive,
    FuelPumpActive,
    CheckEngineActive,
    EgoHeaterActive,
    LambdaProtectActive,
    FanActive,
    Fan2Active,
    CurrentGear,
    DistanceTraveled,
    // 513 BASE1
    Rpm,
    IgnitionTiming,
    InjectorDuty,
    IgnitionDuty,
    VehicleSpeed,
    FlexPct,
    // 515 BASE3
    ManifoldPressure,
    CoolantTemp,
    IntakeTemp,
    Aux1Temp,
    Aux2Temp,
    McuTemp,
    FuelLevel,
    // 516 BASE4
    OilPressure,
    OilTemp,
    FuelTemp,
    BatteryVoltage,
    // 517 BASE5
    CylinderAirMass,
    EstimatedMaf,
    InjectorPulseWidth,
    KnockCount,
    // 518 BASE6
    FuelUsed,
    FuelFlow,
    FuelTrim1,
    FuelTrim2,
    // 519 BASE7
    Lambda1,
    Lambda2,
    FuelPressureLow,
    FuelPressureHigh,
    // 420, dashboard to bus
    DashFuelLevel,
}

/// Layout of one signal inside a payload.
#[derive(Debug)]
pub struct SignalDescriptor {
    /// 1. Signal name as it appears in the ECU's DBC file.
    pub name: &'static str,
    /// 2. Destination in the target structure.
    pub signal: Signal,
    /// 3. Bit offset of the least significant bit (little-endian payload).
    pub bit_offset: u8,
    /// 4. Width in bits (1..=64).
    pub bit_width: u8,
    /// 5. Two's-complement interpretation of the raw bits.
    pub signed: bool,
    /// 6. Physical value per raw count.
    pub scale: f32,
    /// 7. Physical value of raw zero.
    pub offset: f32,
    /// 8. Physical unit, when meaningful.
    pub unit: Option<&'static str>,
}

impl SignalDescriptor {
    /// Number of payload bytes needed to hold this signal.
    pub const fn end_byte(&self) -> usize {
        (self.bit_offset as usize + self.bit_width as usize + 7) / 8
    }
}

/// Which half of a GPS fix a GPS frame carries. Each is one little-endian `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpsAxis {
    Latitude,
    Longitude,
    SpeedMph,
}

/// How the bytes of a recognized frame are interpreted.
#[derive(Debug)]
pub enum PayloadKind {
    /// Bit-packed signals, extracted by the schema engine.
    Signals(&'static [SignalDescriptor]),
    /// Verbatim status text, NUL-terminated within the payload length.
    Text,
    /// One `f64` GPS component.
    Gps(GpsAxis),
}

/// Static description of one frame identifier.
#[derive(Debug)]
pub struct FrameSchema {
    /// 1. 11-bit CAN identifier.
    pub id: u16,
    /// 2. Message name (diagnostics).
    pub name: &'static str,
    /// 3. Nominal payload length in bytes.
    pub length: u8,
    /// 4. Payload interpretation.
    pub payload: PayloadKind,
}

impl FrameSchema {
    /// Minimum payload length a frame must carry before it can be decoded.
    pub fn required_len(&self) -> usize {
        match self.payload {
            PayloadKind::Signals(signals) => signals
                .iter()
                .map(SignalDescriptor::end_byte)
                .max()
                .unwrap_or(0),
            PayloadKind::Text => 1,
            PayloadKind::Gps(_) => 8,
        }
    }

    /// Signal descriptors, empty for non bit-packed payloads.
    pub fn signals(&self) -> &'static [SignalDescriptor] {
        match self.payload {
            PayloadKind::Signals(signals) => signals,
            _ => &[],
        }
    }
}
