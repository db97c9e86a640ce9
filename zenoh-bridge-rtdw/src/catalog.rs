//! The static point table of the RTD-W interface.

use crate::error::EngineError;
use crate::point::{FunctionCode, PointId, PresentationSpec, RegisterSpec, StoredAs};
use rtdw_common::{PointDescriptor, PointRef, PresentationKind};
use std::collections::HashMap;
use thiserror::Error;

use FunctionCode::{ReadHolding, ReadInput};
use PresentationKind::{Contact, Counter, PushOn, Selector, Setpoint, Switch, Temperature};
use StoredAs::{Flag, Text};

/// Catalog construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("point '{0}' is mapped more than once")]
    Duplicate(PointId),
    #[error("point '{0}' has no mapping")]
    Missing(PointId),
}

/// One row of the catalog: presentation and register mapping of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointEntry {
    pub id: PointId,
    pub presentation: PresentationSpec,
    pub register: RegisterSpec,
}

const fn entry(id: PointId, presentation: PresentationSpec, register: RegisterSpec) -> PointEntry {
    PointEntry {
        id,
        presentation,
        register,
    }
}

const CONTROL_SOURCE_LEVELS: &[(&str, &str)] = &[
    ("LevelNames", "All|External|Local|All"),
    ("LevelOffHidden", "true"),
    ("SelectorStyle", "0"),
];

const SHIFT_LEVELS: &[(&str, &str)] = &[
    (
        "LevelNames",
        "|-5°C|-4°C|-3°C|-2°C|-1°C|0°C|+1°C|+2°C|+3°C|+4°C|+5°C",
    ),
    ("LevelOffHidden", "true"),
    ("SelectorStyle", "1"),
];

const RUNNING_HOURS: &[(&str, &str)] = &[("ValueQuantity", "Time"), ("ValueUnits", "hours")];

/// Register map of an RTD-W at slave address 1 driving a single unit.
///
/// Scan order is table order.
pub const RTDW_POINTS: [PointEntry; 24] = [
    entry(
        PointId::LeavingWaterTemp,
        PresentationSpec::new("Leaving water temperature", Temperature, true),
        RegisterSpec::word(123, 2, ReadInput, true, Text),
    ),
    entry(
        PointId::ReturnWaterTemp,
        PresentationSpec::new("Return water temperature", Temperature, true),
        RegisterSpec::word(131, 2, ReadInput, true, Text),
    ),
    entry(
        PointId::DhwTankTemp,
        PresentationSpec::new("Domestic hot water temperature", Temperature, true),
        RegisterSpec::word(132, 2, ReadInput, true, Text),
    ),
    entry(
        PointId::OutdoorTemp,
        PresentationSpec::new("Outdoor temperature", Temperature, true),
        RegisterSpec::word(133, 2, ReadInput, true, Text),
    ),
    entry(
        PointId::RoomTemp,
        PresentationSpec::new("Room temperature", Temperature, true),
        RegisterSpec::word(50, 2, ReadInput, true, Text),
    ),
    entry(
        PointId::RoomTempSetpoint,
        PresentationSpec::new("Room temperature setpoint", Setpoint, true)
            .describe("Adjustable between 16 and 32 °C"),
        RegisterSpec::word(5, 0, ReadHolding, false, Text),
    ),
    entry(
        PointId::LeavingWaterSetpoint,
        PresentationSpec::new("Heating water setpoint", Setpoint, true)
            .describe("Adjustable between 25 and 80 °C"),
        RegisterSpec::word(1, 0, ReadHolding, false, Text),
    ),
    entry(
        PointId::SpaceHeatingCommand,
        PresentationSpec::new("Space heating on/off", Switch, false),
        RegisterSpec::word(4, 0, ReadHolding, false, Flag),
    ),
    entry(
        PointId::DhwReheatCommand,
        PresentationSpec::new("Hot water reheat", Switch, false),
        RegisterSpec::word(6, 0, ReadHolding, false, Flag),
    ),
    entry(
        PointId::DhwStorageCommand,
        PresentationSpec::new("Hot water storage", Switch, false),
        RegisterSpec::word(7, 0, ReadHolding, false, Flag),
    ),
    entry(
        PointId::ControlSource,
        PresentationSpec::new("Control source", Selector, false)
            .with_options(CONTROL_SOURCE_LEVELS),
        RegisterSpec::word(8, 0, ReadHolding, false, Text),
    ),
    entry(
        PointId::QuietMode,
        PresentationSpec::new("Quiet mode", Switch, false),
        RegisterSpec::word(9, 0, ReadHolding, false, Flag),
    ),
    entry(
        PointId::WeatherDependentSetpoint,
        PresentationSpec::new("Weather dependent setpoint", Switch, false),
        RegisterSpec::word(10, 0, ReadHolding, false, Flag),
    ),
    entry(
        PointId::LeavingWaterShift,
        PresentationSpec::new("Leaving water temperature shift", Selector, true)
            .describe("Adjustable between -5 and +5 °C")
            .with_options(SHIFT_LEVELS),
        RegisterSpec::word(11, 0, ReadHolding, true, Text),
    ),
    entry(
        PointId::ResetRunHourCounter,
        PresentationSpec::new("Reset running hours", PushOn, false),
        RegisterSpec::word(12, 0, ReadHolding, false, Text),
    ),
    entry(
        PointId::SpaceHeatingStatus,
        PresentationSpec::new("Space heating", Contact, true),
        RegisterSpec::word(70, 0, ReadInput, false, Flag),
    ),
    entry(
        PointId::CirculationPump,
        PresentationSpec::new("Circulation pump", Contact, true),
        RegisterSpec::word(71, 0, ReadInput, false, Flag),
    ),
    entry(
        PointId::Compressor,
        PresentationSpec::new("Compressor", Contact, true),
        RegisterSpec::word(72, 0, ReadInput, false, Flag),
    ),
    entry(
        PointId::Disinfection,
        PresentationSpec::new("Hot water disinfection", Contact, true),
        RegisterSpec::word(74, 0, ReadInput, false, Flag),
    ),
    entry(
        PointId::Setback,
        PresentationSpec::new("Setback mode", Contact, true),
        RegisterSpec::word(75, 0, ReadInput, false, Flag),
    ),
    entry(
        PointId::Defrost,
        PresentationSpec::new("Defrost", Contact, true),
        RegisterSpec::word(76, 0, ReadInput, false, Flag),
    ),
    entry(
        PointId::DhwReheatStatus,
        PresentationSpec::new("Hot water reheat state", Contact, true),
        RegisterSpec::word(77, 0, ReadInput, false, Flag),
    ),
    entry(
        PointId::DhwStorageStatus,
        PresentationSpec::new("Hot water storage state", Contact, true),
        RegisterSpec::word(78, 0, ReadInput, false, Flag),
    ),
    entry(
        PointId::PumpRunningHours,
        PresentationSpec::new("Pump running hours", Counter, true).with_options(RUNNING_HOURS),
        RegisterSpec::long(80, ReadInput, false),
    ),
];

/// Immutable, ordered point table covering every [`PointId`] exactly once.
#[derive(Debug, Clone)]
pub struct PointCatalog {
    entries: Vec<PointEntry>,
    /// Position of each point in `entries`.
    index: HashMap<PointId, usize>,
}

impl PointCatalog {
    /// The RTD-W register map.
    pub fn rtdw() -> Result<Self, CatalogError> {
        Self::from_entries(RTDW_POINTS.to_vec())
    }

    /// Build a catalog, rejecting duplicated or missing points.
    pub fn from_entries(entries: Vec<PointEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());

        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.id, position).is_some() {
                return Err(CatalogError::Duplicate(entry.id));
            }
        }

        if let Some(missing) = PointId::ALL.iter().find(|id| !index.contains_key(*id)) {
            return Err(CatalogError::Missing(*missing));
        }

        Ok(Self { entries, index })
    }

    fn entry(&self, id: PointId) -> Result<&PointEntry, EngineError> {
        self.index
            .get(&id)
            .and_then(|position| self.entries.get(*position))
            .ok_or_else(|| EngineError::UnknownPoint(id.to_string()))
    }

    /// Register mapping of a point.
    pub fn lookup(&self, id: PointId) -> Result<&RegisterSpec, EngineError> {
        self.entry(id).map(|entry| &entry.register)
    }

    /// Presentation of a point.
    pub fn presentation(&self, id: PointId) -> Result<&PresentationSpec, EngineError> {
        self.entry(id).map(|entry| &entry.presentation)
    }

    /// Resolve a hub-supplied reference (unit number or slug).
    pub fn resolve(&self, point: &PointRef) -> Result<PointId, EngineError> {
        let id = match point {
            PointRef::Unit(unit) => PointId::from_unit(*unit),
            PointRef::Name(name) => name
                .parse::<PointId>()
                .ok()
                .or_else(|| name.parse::<u8>().ok().and_then(PointId::from_unit)),
        };

        id.ok_or_else(|| EngineError::UnknownPoint(point.to_string()))
    }

    /// Entries in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &PointEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptors announced to the hub so it can create its devices.
    pub fn descriptors(&self) -> Vec<PointDescriptor> {
        self.entries
            .iter()
            .map(|entry| PointDescriptor {
                unit: entry.id.unit(),
                point: entry.id.as_str().to_string(),
                name: entry.presentation.name.to_string(),
                kind: entry.presentation.kind,
                used: entry.presentation.used,
                description: entry.presentation.description.map(str::to_string),
                options: entry
                    .presentation
                    .options
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect(),
            })
            .collect()
    }
}
