//! Static frame schemas for every identifier the dashboard understands.
//!
//! The ECU broadcast (`BASE0`..`BASE7`) follows the layout of the ECU's DBC
//! file: 11-bit identifiers, eight-byte payloads, little-endian fields.
//! `BASE2` (514) is not broadcast by the firmware revisions in use and is
//! therefore absent.
use crate::core::{FrameSchema, GpsAxis, PayloadKind, Signal, SignalDescriptor};
use crate::error::EncodeError;
use crate::infra::codec::{engine, traits::SignalAccess};

/// Status text pushed by the ECU (verbatim ASCII).
pub const STATUS_TEXT_ID: u16 = 508;
pub const BASE0_ID: u16 = 512;
pub const BASE1_ID: u16 = 513;
pub const BASE3_ID: u16 = 515;
pub const BASE4_ID: u16 = 516;
pub const BASE5_ID: u16 = 517;
pub const BASE6_ID: u16 = 518;
pub const BASE7_ID: u16 = 519;
/// Fuel level percentage sent by the dashboard back onto the bus.
pub const DASH_FUEL_ID: u16 = 420;
pub const GPS_LATITUDE_ID: u16 = 0x0F6;
pub const GPS_LONGITUDE_ID: u16 = 0x0F7;
pub const GPS_SPEED_ID: u16 = 0x0F8;

const fn unsigned(
    name: &'static str,
    signal: Signal,
    bit_offset: u8,
    bit_width: u8,
    scale: f32,
    offset: f32,
    unit: Option<&'static str>,
) -> SignalDescriptor {
    SignalDescriptor {
        name,
        signal,
        bit_offset,
        bit_width,
        signed: false,
        scale,
        offset,
        unit,
    }
}

const fn signed(
    name: &'static str,
    signal: Signal,
    bit_offset: u8,
    bit_width: u8,
    scale: f32,
    unit: Option<&'static str>,
) -> SignalDescriptor {
    SignalDescriptor {
        name,
        signal,
        bit_offset,
        bit_width,
        signed: true,
        scale,
        offset: 0.0,
        unit,
    }
}

const fn flag(name: &'static str, signal: Signal, bit_offset: u8) -> SignalDescriptor {
    unsigned(name, signal, bit_offset, 1, 1.0, 0.0, None)
}

const KPA_PER_COUNT: f32 = 0.033_333_33;

//==================================================================================BASE0
static BASE0_SIGNALS: [SignalDescriptor; 12] = [
    unsigned("WarningCounter", Signal::WarningCounter, 0, 16, 1.0, 0.0, None),
    unsigned("LastError", Signal::LastError, 16, 16, 1.0, 0.0, None),
    flag("RevLimAct", Signal::RevLimiterActive, 32),
    flag("MainRelayAct", Signal::MainRelayActive, 33),
    flag("FuelPumpAct", Signal::FuelPumpActive, 34),
    flag("CELAct", Signal::CheckEngineActive, 35),
    flag("EGOHeatAct", Signal::EgoHeaterActive, 36),
    flag("LambdaProtectAct", Signal::LambdaProtectActive, 37),
    flag("FanAct", Signal::FanActive, 38),
    flag("Fan2Act", Signal::Fan2Active, 39),
    unsigned("CurrentGear", Signal::CurrentGear, 40, 8, 1.0, 0.0, None),
    unsigned("DistanceTraveled", Signal::DistanceTraveled, 48, 16, 0.1, 0.0, Some("km")),
];

//==================================================================================BASE1
static BASE1_SIGNALS: [SignalDescriptor; 6] = [
    unsigned("RPM", Signal::Rpm, 0, 16, 1.0, 0.0, Some("RPM")),
    signed("IgnitionTiming", Signal::IgnitionTiming, 16, 16, 0.02, Some("deg")),
    unsigned("InjDuty", Signal::InjectorDuty, 32, 8, 0.5, 0.0, Some("%")),
    unsigned("IgnDuty", Signal::IgnitionDuty, 40, 8, 0.5, 0.0, Some("%")),
    unsigned("VehicleSpeed", Signal::VehicleSpeed, 48, 8, 1.0, 0.0, Some("kph")),
    unsigned("FlexPct", Signal::FlexPct, 56, 8, 1.0, 0.0, Some("%")),
];

//==================================================================================BASE3
static BASE3_SIGNALS: [SignalDescriptor; 7] = [
    unsigned("MAP", Signal::ManifoldPressure, 0, 16, KPA_PER_COUNT, 0.0, Some("kPa")),
    unsigned("CoolantTemp", Signal::CoolantTemp, 16, 8, 1.0, -40.0, Some("deg C")),
    unsigned("IntakeTemp", Signal::IntakeTemp, 24, 8, 1.0, -40.0, Some("deg C")),
    unsigned("AUX1Temp", Signal::Aux1Temp, 32, 8, 1.0, -40.0, Some("deg C")),
    unsigned("AUX2Temp", Signal::Aux2Temp, 40, 8, 1.0, -40.0, Some("deg C")),
    unsigned("MCUTemp", Signal::McuTemp, 48, 8, 1.0, -40.0, Some("deg C")),
    unsigned("FuelLevel", Signal::FuelLevel, 56, 8, 0.5, 0.0, Some("%")),
];

//==================================================================================BASE4
// Bytes 0..2 are reserved and transmitted as zero.
static BASE4_SIGNALS: [SignalDescriptor; 4] = [
    unsigned("OilPress", Signal::OilPressure, 16, 16, KPA_PER_COUNT, 0.0, Some("kPa")),
    unsigned("OilTemperature", Signal::OilTemp, 32, 8, 1.0, -40.0, Some("deg C")),
    unsigned("FuelTemperature", Signal::FuelTemp, 40, 8, 1.0, -40.0, Some("deg C")),
    unsigned("BattVolt", Signal::BatteryVoltage, 48, 16, 0.001, 0.0, Some("V")),
];

//==================================================================================BASE5
static BASE5_SIGNALS: [SignalDescriptor; 4] = [
    unsigned("CylAM", Signal::CylinderAirMass, 0, 16, 1.0, 0.0, Some("mg")),
    unsigned("EstMAF", Signal::EstimatedMaf, 16, 16, 0.01, 0.0, Some("kg/h")),
    unsigned("InjPW", Signal::InjectorPulseWidth, 32, 16, 0.003_333_333, 0.0, Some("ms")),
    unsigned("KnockCt", Signal::KnockCount, 48, 16, 1.0, 0.0, Some("count")),
];

//==================================================================================BASE6
// Trims are two's-complement (range -50..50 %).
static BASE6_SIGNALS: [SignalDescriptor; 4] = [
    unsigned("FuelUsed", Signal::FuelUsed, 0, 16, 1.0, 0.0, Some("g")),
    unsigned("FuelFlow", Signal::FuelFlow, 16, 16, 0.005, 0.0, Some("g/s")),
    signed("FuelTrim1", Signal::FuelTrim1, 32, 16, 0.01, Some("%")),
    signed("FuelTrim2", Signal::FuelTrim2, 48, 16, 0.01, Some("%")),
];

//==================================================================================BASE7
static BASE7_SIGNALS: [SignalDescriptor; 4] = [
    unsigned("Lam1", Signal::Lambda1, 0, 16, 0.0001, 0.0, Some("lambda")),
    unsigned("Lam2", Signal::Lambda2, 16, 16, 0.0001, 0.0, Some("lambda")),
    unsigned("FpLow", Signal::FuelPressureLow, 32, 16, KPA_PER_COUNT, 0.0, Some("kPa")),
    unsigned("FpHigh", Signal::FuelPressureHigh, 48, 16, 0.1, 0.0, Some("bar")),
];

//==================================================================================DASH
static DASH_FUEL_SIGNALS: [SignalDescriptor; 1] = [unsigned(
    "FuelPct",
    Signal::DashFuelLevel,
    0,
    8,
    1.0,
    0.0,
    Some("%"),
)];

//==================================================================================TABLE
/// Every known frame, ordered by identifier.
pub static SCHEMAS: [FrameSchema; 12] = [
    FrameSchema {
        id: GPS_LATITUDE_ID,
        name: "GPS_LAT",
        length: 8,
        payload: PayloadKind::Gps(GpsAxis::Latitude),
    },
    FrameSchema {
        id: GPS_LONGITUDE_ID,
        name: "GPS_LNG",
        length: 8,
        payload: PayloadKind::Gps(GpsAxis::Longitude),
    },
    FrameSchema {
        id: GPS_SPEED_ID,
        name: "GPS_SPEED",
        length: 8,
        payload: PayloadKind::Gps(GpsAxis::SpeedMph),
    },
    FrameSchema {
        id: DASH_FUEL_ID,
        name: "DASH_FUEL",
        length: 1,
        payload: PayloadKind::Signals(&DASH_FUEL_SIGNALS),
    },
    FrameSchema {
        id: STATUS_TEXT_ID,
        name: "STATUS_TEXT",
        length: 8,
        payload: PayloadKind::Text,
    },
    FrameSchema {
        id: BASE0_ID,
        name: "BASE0",
        length: 8,
        payload: PayloadKind::Signals(&BASE0_SIGNALS),
    },
    FrameSchema {
        id: BASE1_ID,
        name: "BASE1",
        length: 8,
        payload: PayloadKind::Signals(&BASE1_SIGNALS),
    },
    FrameSchema {
        id: BASE3_ID,
        name: "BASE3",
        length: 8,
        payload: PayloadKind::Signals(&BASE3_SIGNALS),
    },
    FrameSchema {
        id: BASE4_ID,
        name: "BASE4",
        length: 8,
        payload: PayloadKind::Signals(&BASE4_SIGNALS),
    },
    FrameSchema {
        id: BASE5_ID,
        name: "BASE5",
        length: 8,
        payload: PayloadKind::Signals(&BASE5_SIGNALS),
    },
    FrameSchema {
        id: BASE6_ID,
        name: "BASE6",
        length: 8,
        payload: PayloadKind::Signals(&BASE6_SIGNALS),
    },
    FrameSchema {
        id: BASE7_ID,
        name: "BASE7",
        length: 8,
        payload: PayloadKind::Signals(&BASE7_SIGNALS),
    },
];

/// Bit-packed ECU broadcast frames, the ones the test generator emits.
pub const ECU_BROADCAST_IDS: [u16; 7] = [
    BASE0_ID, BASE1_ID, BASE3_ID, BASE4_ID, BASE5_ID, BASE6_ID, BASE7_ID,
];

/// Schema for `id`, or `None` when the identifier is not recognized.
pub fn lookup(id: u16) -> Option<&'static FrameSchema> {
    SCHEMAS.iter().find(|schema| schema.id == id)
}

/// One GPS fix as broadcast by the GPS node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub speed_mph: f64,
}

/// Identifier and payload of the three frames carrying `fix`, in the order
/// the GPS node sends them (latitude, longitude, speed).
pub fn gps_payloads(fix: &GpsFix) -> [(u16, [u8; 8]); 3] {
    [
        (GPS_LATITUDE_ID, fix.latitude.to_le_bytes()),
        (GPS_LONGITUDE_ID, fix.longitude.to_le_bytes()),
        (GPS_SPEED_ID, fix.speed_mph.to_le_bytes()),
    ]
}

/// Read the `f64` carried by a GPS frame.
pub fn gps_value(payload: &[u8]) -> Option<f64> {
    let bytes: [u8; 8] = payload.get(..8)?.try_into().ok()?;
    Some(f64::from_le_bytes(bytes))
}

/// Fuel level the dashboard reports on the bus (identifier 420), in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashFuel {
    pub percent: u8,
}

impl SignalAccess for DashFuel {
    fn signal(&self, signal: Signal) -> Option<f32> {
        match signal {
            Signal::DashFuelLevel => Some(self.percent as f32),
            _ => None,
        }
    }

    fn set_signal(&mut self, signal: Signal, value: f32) -> Option<()> {
        match signal {
            Signal::DashFuelLevel => {
                self.percent = value as u8;
                Some(())
            }
            _ => None,
        }
    }
}

impl DashFuel {
    /// Clamp a measured level to 0..=100 %.
    pub fn from_level(level: f32) -> Self {
        let clamped = if level.is_nan() {
            0.0
        } else {
            level.clamp(0.0, 100.0)
        };
        Self {
            percent: clamped as u8,
        }
    }

    /// One-byte payload for identifier 420.
    pub fn payload(&self) -> Result<[u8; 1], EncodeError> {
        let schema = lookup(DASH_FUEL_ID).ok_or(EncodeError::UnknownIdentifier { id: DASH_FUEL_ID })?;
        let mut payload = [0u8; 1];
        engine::encode_from(self, &mut payload, schema)?;
        Ok(payload)
    }
}
