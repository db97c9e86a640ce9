//! Point identities and register/presentation records.

use rtdw_common::PresentationKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The 24 points exposed by the RTD-W interface.
///
/// Discriminants are the hub unit numbers and stay stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PointId {
    LeavingWaterTemp = 1,
    ReturnWaterTemp = 2,
    DhwTankTemp = 3,
    OutdoorTemp = 4,
    RoomTemp = 5,
    RoomTempSetpoint = 6,
    LeavingWaterSetpoint = 7,
    SpaceHeatingCommand = 8,
    DhwReheatCommand = 9,
    DhwStorageCommand = 10,
    ControlSource = 11,
    QuietMode = 12,
    WeatherDependentSetpoint = 13,
    LeavingWaterShift = 14,
    ResetRunHourCounter = 15,
    SpaceHeatingStatus = 16,
    CirculationPump = 17,
    Compressor = 18,
    Disinfection = 19,
    Setback = 20,
    Defrost = 21,
    DhwReheatStatus = 22,
    DhwStorageStatus = 23,
    PumpRunningHours = 24,
}

impl PointId {
    pub const COUNT: usize = 24;

    /// Every point, in unit order.
    pub const ALL: [PointId; Self::COUNT] = [
        PointId::LeavingWaterTemp,
        PointId::ReturnWaterTemp,
        PointId::DhwTankTemp,
        PointId::OutdoorTemp,
        PointId::RoomTemp,
        PointId::RoomTempSetpoint,
        PointId::LeavingWaterSetpoint,
        PointId::SpaceHeatingCommand,
        PointId::DhwReheatCommand,
        PointId::DhwStorageCommand,
        PointId::ControlSource,
        PointId::QuietMode,
        PointId::WeatherDependentSetpoint,
        PointId::LeavingWaterShift,
        PointId::ResetRunHourCounter,
        PointId::SpaceHeatingStatus,
        PointId::CirculationPump,
        PointId::Compressor,
        PointId::Disinfection,
        PointId::Setback,
        PointId::Defrost,
        PointId::DhwReheatStatus,
        PointId::DhwStorageStatus,
        PointId::PumpRunningHours,
    ];

    /// Hub unit number.
    pub fn unit(self) -> u8 {
        self as u8
    }

    /// Look a point up by hub unit number.
    pub fn from_unit(unit: u8) -> Option<PointId> {
        PointId::ALL.iter().copied().find(|id| id.unit() == unit)
    }

    /// Stable slug used in key expressions and commands.
    pub fn as_str(self) -> &'static str {
        match self {
            PointId::LeavingWaterTemp => "leaving_water_temp",
            PointId::ReturnWaterTemp => "return_water_temp",
            PointId::DhwTankTemp => "dhw_tank_temp",
            PointId::OutdoorTemp => "outdoor_temp",
            PointId::RoomTemp => "room_temp",
            PointId::RoomTempSetpoint => "room_temp_setpoint",
            PointId::LeavingWaterSetpoint => "leaving_water_setpoint",
            PointId::SpaceHeatingCommand => "space_heating_command",
            PointId::DhwReheatCommand => "dhw_reheat_command",
            PointId::DhwStorageCommand => "dhw_storage_command",
            PointId::ControlSource => "control_source",
            PointId::QuietMode => "quiet_mode",
            PointId::WeatherDependentSetpoint => "weather_dependent_setpoint",
            PointId::LeavingWaterShift => "leaving_water_shift",
            PointId::ResetRunHourCounter => "reset_run_hour_counter",
            PointId::SpaceHeatingStatus => "space_heating_status",
            PointId::CirculationPump => "circulation_pump",
            PointId::Compressor => "compressor",
            PointId::Disinfection => "disinfection",
            PointId::Setback => "setback",
            PointId::Defrost => "defrost",
            PointId::DhwReheatStatus => "dhw_reheat_status",
            PointId::DhwStorageStatus => "dhw_storage_status",
            PointId::PumpRunningHours => "pump_running_hours",
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PointId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PointId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown point '{}'", s))
    }
}

/// Modbus function code a register is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCode {
    /// 3: holding register, read/write.
    ReadHolding,
    /// 4: input register, read-only.
    ReadInput,
}

impl FunctionCode {
    /// Function code used for every write.
    pub const WRITE_SINGLE_REGISTER: u8 = 6;

    pub fn code(self) -> u8 {
        match self {
            FunctionCode::ReadHolding => 3,
            FunctionCode::ReadInput => 4,
        }
    }

    /// Only holding registers accept writes.
    pub fn is_writable(self) -> bool {
        matches!(self, FunctionCode::ReadHolding)
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Number of registers behind a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterWidth {
    /// One 16-bit register.
    Word,
    /// Two registers read as one 32-bit value.
    Long,
}

/// Which hub field carries the point's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredAs {
    /// The register word is the on/off flag itself.
    Flag,
    /// The register value is rendered into the display string.
    Text,
}

/// Where and how a point lives on the slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegisterSpec {
    pub address: u16,
    /// Implied decimals applied symmetrically on read and write (0 or 2).
    pub decimals: u8,
    pub function: FunctionCode,
    pub signed: bool,
    pub width: RegisterWidth,
    pub stored_as: StoredAs,
}

impl RegisterSpec {
    pub const fn word(
        address: u16,
        decimals: u8,
        function: FunctionCode,
        signed: bool,
        stored_as: StoredAs,
    ) -> Self {
        Self {
            address,
            decimals,
            function,
            signed,
            width: RegisterWidth::Word,
            stored_as,
        }
    }

    pub const fn long(address: u16, function: FunctionCode, signed: bool) -> Self {
        Self {
            address,
            decimals: 0,
            function,
            signed,
            width: RegisterWidth::Long,
            stored_as: StoredAs::Text,
        }
    }
}

/// How the hub should present a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationSpec {
    pub name: &'static str,
    pub kind: PresentationKind,
    /// Enabled in the hub as soon as it is created.
    pub used: bool,
    pub description: Option<&'static str>,
    /// Hub device options (selector level names, counter units).
    pub options: &'static [(&'static str, &'static str)],
}

impl PresentationSpec {
    pub const fn new(name: &'static str, kind: PresentationKind, used: bool) -> Self {
        Self {
            name,
            kind,
            used,
            description: None,
            options: &[],
        }
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub const fn with_options(mut self, options: &'static [(&'static str, &'static str)]) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_are_contiguous() {
        for (index, id) in PointId::ALL.iter().enumerate() {
            assert_eq!(id.unit() as usize, index + 1);
            assert_eq!(PointId::from_unit(id.unit()), Some(*id));
        }
        assert_eq!(PointId::from_unit(0), None);
        assert_eq!(PointId::from_unit(25), None);
    }

    #[test]
    fn test_slug_roundtrip() {
        for id in PointId::ALL {
            assert_eq!(id.as_str().parse::<PointId>(), Ok(id));
            assert_eq!(
                serde_json::to_string(&id).unwrap(),
                format!("\"{}\"", id.as_str())
            );
        }
        assert!("heat_pump".parse::<PointId>().is_err());
    }

    #[test]
    fn test_function_codes() {
        assert_eq!(FunctionCode::ReadHolding.code(), 3);
        assert_eq!(FunctionCode::ReadInput.code(), 4);
        assert!(FunctionCode::ReadHolding.is_writable());
        assert!(!FunctionCode::ReadInput.is_writable());
    }
}
