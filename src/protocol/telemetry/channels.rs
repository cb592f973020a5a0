//! Fixed three-letter channel identifiers understood by the pit-wall receiver.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Rpm,
    CoolantTemp,
    CoolantPressure,
    OilTemp,
    OilPressure,
    BatteryVoltage,
    MissionElapsed,
    Fault,
    FuelLevel,
    EngineStatus,
    Advance,
    Oxygen,
    IntakeTemp,
    SyncLoss,
    ManifoldPressure,
    VolumetricEfficiency,
    AfrTarget,
    Throttle,
    ProtectStatus,
    FanDuty,
    WarningCounter,
    LastError,
    KnockCount,
}

impl Channel {
    /// Wire identifier, always three ASCII characters.
    pub const fn id(self) -> &'static str {
        match self {
            Channel::Rpm => "RPM",
            Channel::CoolantTemp => "T_C",
            Channel::CoolantPressure => "P_C",
            Channel::OilTemp => "T_O",
            Channel::OilPressure => "P_O",
            Channel::BatteryVoltage => "VBA",
            Channel::MissionElapsed => "MET",
            Channel::Fault => "FLT",
            Channel::FuelLevel => "GAS",
            Channel::EngineStatus => "S_E",
            Channel::Advance => "ADV",
            Channel::Oxygen => "O_2",
            Channel::IntakeTemp => "IAT",
            Channel::SyncLoss => "SLS",
            Channel::ManifoldPressure => "MAP",
            Channel::VolumetricEfficiency => "V_E",
            Channel::AfrTarget => "AFT",
            Channel::Throttle => "TPS",
            Channel::ProtectStatus => "S_P",
            Channel::FanDuty => "FAN",
            Channel::WarningCounter => "S_1",
            Channel::LastError => "S_3",
            Channel::KnockCount => "S_4",
        }
    }
}

/// Engine-critical channels, written into every packet.
pub const TIER_ONE: [Channel; 4] = [
    Channel::Rpm,
    Channel::OilPressure,
    Channel::CoolantTemp,
    Channel::Fault,
];

/// Everything else, written into every other packet.
pub const TIER_TWO: [Channel; 19] = [
    Channel::CoolantPressure,
    Channel::OilTemp,
    Channel::BatteryVoltage,
    Channel::MissionElapsed,
    Channel::FuelLevel,
    Channel::EngineStatus,
    Channel::Advance,
    Channel::Oxygen,
    Channel::IntakeTemp,
    Channel::SyncLoss,
    Channel::ManifoldPressure,
    Channel::VolumetricEfficiency,
    Channel::AfrTarget,
    Channel::Throttle,
    Channel::ProtectStatus,
    Channel::FanDuty,
    Channel::WarningCounter,
    Channel::LastError,
    Channel::KnockCount,
];

/// Identifier of the GPS position sample line.
pub const GPS_LINE_ID: &str = "GPS";
/// Identifier of the ground-speed sample line.
pub const SPEED_LINE_ID: &str = "SPD";
