use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Two-field value the hub stores for a point.
///
/// `flag` is the boolean/ordinal state (on/off, selector active) and `display`
/// the string-formatted value (temperature, selector level, counter).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointUpdate {
    pub flag: i64,
    pub display: String,
}

impl PointUpdate {
    /// Create an update from a flag and a display value.
    pub fn new(flag: i64, display: impl Into<String>) -> Self {
        Self {
            flag,
            display: display.into(),
        }
    }

    /// Plain toggle switched on.
    pub fn on() -> Self {
        Self::new(1, "1")
    }

    /// Plain toggle switched off.
    pub fn off() -> Self {
        Self::new(0, "0")
    }
}

impl fmt::Display for PointUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, \"{}\")", self.flag, self.display)
    }
}

/// A point update as published on Zenoh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSample {
    /// Unix epoch milliseconds when the value was read or written.
    pub timestamp: i64,

    /// Device name from configuration (e.g., "altherma").
    pub source: String,

    /// Point slug (e.g., "leaving_water_temp").
    pub point: String,

    /// Hub unit number of the point.
    pub unit: u8,

    #[serde(flatten)]
    pub update: PointUpdate,

    /// Additional context labels (e.g., register address).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
}

impl PointSample {
    /// Create a new sample with the current timestamp.
    pub fn new(
        source: impl Into<String>,
        point: impl Into<String>,
        unit: u8,
        update: PointUpdate,
    ) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            source: source.into(),
            point: point.into(),
            unit,
            update,
            labels: HashMap::new(),
        }
    }

    /// Add a label to this sample.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Which side of the bridge a failure happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedOperation {
    Read,
    Write,
}

impl FailedOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedOperation::Read => "read",
            FailedOperation::Write => "write",
        }
    }
}

impl fmt::Display for FailedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure report for a single point.
///
/// Published instead of a value so the hub keeps the last known value and can
/// flag the device as failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointFailure {
    pub timestamp: i64,
    pub source: String,
    pub point: String,
    pub unit: u8,
    pub operation: FailedOperation,
    pub error: String,
}

impl PointFailure {
    pub fn new(
        source: impl Into<String>,
        point: impl Into<String>,
        unit: u8,
        operation: FailedOperation,
        error: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: current_timestamp_millis(),
            source: source.into(),
            point: point.into(),
            unit,
            operation,
            error: error.into(),
        }
    }
}

/// How the hub presents a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationKind {
    /// Continuous temperature reading.
    Temperature,
    /// Adjustable thermostat setpoint.
    Setpoint,
    /// On/off switch.
    Switch,
    /// Multi-level selector switch.
    Selector,
    /// Momentary push button.
    PushOn,
    /// Read-only on/off contact.
    Contact,
    /// Cumulative counter.
    Counter,
}

impl PresentationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationKind::Temperature => "temperature",
            PresentationKind::Setpoint => "setpoint",
            PresentationKind::Switch => "switch",
            PresentationKind::Selector => "selector",
            PresentationKind::PushOn => "push_on",
            PresentationKind::Contact => "contact",
            PresentationKind::Counter => "counter",
        }
    }
}

impl fmt::Display for PresentationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one point, announced at startup so the hub can create
/// the matching device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDescriptor {
    pub unit: u8,
    pub point: String,
    pub name: String,
    pub kind: PresentationKind,
    /// Enabled in the hub as soon as it is created.
    pub used: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Command name delivered by the hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandName {
    On,
    Off,
    #[serde(rename = "Set Level")]
    SetLevel,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandName::On => "On",
            CommandName::Off => "Off",
            CommandName::SetLevel => "Set Level",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "On" => Ok(CommandName::On),
            "Off" => Ok(CommandName::Off),
            "Set Level" => Ok(CommandName::SetLevel),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Reference to a point as sent by the hub: unit number or slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointRef {
    Unit(u8),
    Name(String),
}

impl fmt::Display for PointRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointRef::Unit(unit) => write!(f, "{}", unit),
            PointRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<&str> for PointRef {
    fn from(s: &str) -> Self {
        PointRef::Name(s.to_string())
    }
}

impl From<u8> for PointRef {
    fn from(unit: u8) -> Self {
        PointRef::Unit(unit)
    }
}

/// Command delivered by the hub for one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub point: PointRef,
    pub command: CommandName,

    /// Slider, selector or setpoint level in hub units.
    #[serde(default, deserialize_with = "deserialize_level")]
    pub level: f64,

    /// Color parameter of the hub command callback, never used by this bridge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<serde_json::Value>,
}

/// Levels arrive as integers from most hubs and as floats from setpoints.
#[derive(Deserialize)]
#[serde(untagged)]
enum Level {
    Int(i64),
    Float(f64),
}

fn deserialize_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Level::deserialize(deserializer)? {
        Level::Int(level) => level as f64,
        Level::Float(level) => level,
    })
}

impl CommandRequest {
    pub fn new(point: impl Into<PointRef>, command: CommandName, level: f64) -> Self {
        Self {
            point: point.into(),
            command,
            level,
            hue: None,
        }
    }

    pub fn on(point: impl Into<PointRef>) -> Self {
        Self::new(point, CommandName::On, 0.0)
    }

    pub fn off(point: impl Into<PointRef>) -> Self {
        Self::new(point, CommandName::Off, 0.0)
    }

    pub fn set_level(point: impl Into<PointRef>, level: f64) -> Self {
        Self::new(point, CommandName::SetLevel, level)
    }
}

/// Get the current timestamp in milliseconds since Unix epoch.
///
/// Returns 0 if system time is before Unix epoch.
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
