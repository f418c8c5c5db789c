//! Tracked fields and type-checked extraction from raw store snapshots

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Scalar;

/// A named subtree in the store grouping related fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathGroup {
    Devices,
    Signals,
}

impl PathGroup {
    pub const ALL: [PathGroup; 2] = [PathGroup::Devices, PathGroup::Signals];

    pub fn name(&self) -> &'static str {
        match self {
            PathGroup::Devices => "devices",
            PathGroup::Signals => "signals",
        }
    }
}

impl fmt::Display for PathGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A controllable binary output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actuator {
    Servo,
    Relay,
    Led,
    Remote,
}

impl Actuator {
    pub const ALL: [Actuator; 4] = [
        Actuator::Servo,
        Actuator::Relay,
        Actuator::Led,
        Actuator::Remote,
    ];

    /// Key of this actuator under the devices group
    pub fn key(&self) -> &'static str {
        match self {
            Actuator::Servo => "servo",
            Actuator::Relay => "relay",
            Actuator::Led => "led",
            Actuator::Remote => "remote",
        }
    }
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Actuator {
    type Err = crate::HomeSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Actuator::ALL
            .into_iter()
            .find(|a| a.key() == s)
            .ok_or_else(|| crate::HomeSyncError::UnknownActuator(s.to_string()))
    }
}

/// A sensor reading published under the signals group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sensor {
    Temp,
    Humidity,
    Smoke,
    Motion,
    Ldr,
    GasAlert,
}

impl Sensor {
    pub const ALL: [Sensor; 6] = [
        Sensor::Temp,
        Sensor::Humidity,
        Sensor::Smoke,
        Sensor::Motion,
        Sensor::Ldr,
        Sensor::GasAlert,
    ];

    /// Key of this sensor under the signals group
    pub fn key(&self) -> &'static str {
        match self {
            Sensor::Temp => "temp",
            Sensor::Humidity => "humidity",
            Sensor::Smoke => "smoke",
            Sensor::Motion => "motion",
            Sensor::Ldr => "ldr",
            Sensor::GasAlert => "gas_alert",
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The value of an actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Switch {
    #[default]
    Off,
    On,
}

impl Switch {
    /// The binary complement
    pub fn toggled(self) -> Self {
        match self {
            Switch::Off => Switch::On,
            Switch::On => Switch::Off,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Switch::Off => 0,
            Switch::On => 1,
        }
    }

    /// Interpret a store number. Only exactly 0 and 1 are valid.
    pub fn from_number(value: f64) -> Option<Self> {
        if value == 0.0 {
            Some(Switch::Off)
        } else if value == 1.0 {
            Some(Switch::On)
        } else {
            None
        }
    }

    pub fn as_scalar(self) -> Scalar {
        Scalar(i64::from(self.as_u8()))
    }
}

impl From<Switch> for u8 {
    fn from(value: Switch) -> Self {
        value.as_u8()
    }
}

impl TryFrom<u8> for Switch {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Switch::Off),
            1 => Ok(Switch::On),
            other => Err(format!("switch value must be 0 or 1, got {}", other)),
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Switch::Off => write!(f, "OFF"),
            Switch::On => write!(f, "ON"),
        }
    }
}

/// A validated, typed field update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldUpdate {
    Actuator(Actuator, Switch),
    Sensor(Sensor, f64),
}

/// Why a field in a snapshot was not accepted
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Missing,
    NotANumber,
    OutOfRange(f64),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Missing => write!(f, "missing"),
            Rejection::NotANumber => write!(f, "not a number"),
            Rejection::OutOfRange(v) => write!(f, "out of range ({})", v),
        }
    }
}

/// Outcome of checking one tracked field of a snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCheck {
    Accepted(FieldUpdate),
    Rejected {
        key: &'static str,
        reason: Rejection,
    },
}

/// Check every tracked field of `group` in a raw snapshot.
///
/// A snapshot that is not an object (null on first attach, deleted subtree,
/// or a bare scalar) yields no checks at all.
pub fn extract(group: PathGroup, raw: &Value) -> Vec<FieldCheck> {
    let Some(object) = raw.as_object() else {
        return Vec::new();
    };

    match group {
        PathGroup::Devices => Actuator::ALL
            .iter()
            .map(|actuator| match number_field(object.get(actuator.key())) {
                Ok(n) => match Switch::from_number(n) {
                    Some(switch) => FieldCheck::Accepted(FieldUpdate::Actuator(*actuator, switch)),
                    None => FieldCheck::Rejected {
                        key: actuator.key(),
                        reason: Rejection::OutOfRange(n),
                    },
                },
                Err(reason) => FieldCheck::Rejected {
                    key: actuator.key(),
                    reason,
                },
            })
            .collect(),
        PathGroup::Signals => Sensor::ALL
            .iter()
            .map(|sensor| match number_field(object.get(sensor.key())) {
                Ok(n) => FieldCheck::Accepted(FieldUpdate::Sensor(*sensor, n)),
                Err(reason) => FieldCheck::Rejected {
                    key: sensor.key(),
                    reason,
                },
            })
            .collect(),
    }
}

/// Only the accepted updates of a snapshot
pub fn accepted_updates(group: PathGroup, raw: &Value) -> Vec<FieldUpdate> {
    extract(group, raw)
        .into_iter()
        .filter_map(|check| match check {
            FieldCheck::Accepted(update) => Some(update),
            FieldCheck::Rejected { .. } => None,
        })
        .collect()
}

fn number_field(value: Option<&Value>) -> Result<f64, Rejection> {
    match value {
        None => Err(Rejection::Missing),
        Some(Value::Number(n)) => n.as_f64().ok_or(Rejection::NotANumber),
        Some(_) => Err(Rejection::NotANumber),
    }
}
