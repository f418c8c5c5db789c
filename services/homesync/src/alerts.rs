//! Alert classification derived from sensor readings

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::SensorState;

/// Temperature above this is reported as high (°C)
pub const TEMPERATURE_HIGH_C: f64 = 50.0;
/// Humidity above this is reported as high (%)
pub const HUMIDITY_HIGH_PERCENT: f64 = 60.0;
/// Smoke above this is reported as fire (ppm)
pub const SMOKE_FIRE_PPM: f64 = 3000.0;
/// Light sensor readings above this mean night-time
pub const LIGHT_NIGHT_LEVEL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FireLevel {
    Normal,
    Fire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Clear,
    Intruder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayPhase {
    Day,
    Night,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Normal => write!(f, "Normal"),
            Level::High => write!(f, "High"),
        }
    }
}

impl fmt::Display for FireLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireLevel::Normal => write!(f, "Normal"),
            FireLevel::Fire => write!(f, "Fire"),
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Clear => write!(f, "No Intruder Detected"),
            Presence::Intruder => write!(f, "Intruder Detected!"),
        }
    }
}

impl fmt::Display for DayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayPhase::Day => write!(f, "Day-time"),
            DayPhase::Night => write!(f, "Night-time"),
        }
    }
}

/// Labels derived from the current sensor state.
///
/// `None` means the underlying reading is still unknown. Fire is always
/// classified because the gas flag alone is enough to raise it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertLabels {
    pub temperature: Option<Level>,
    pub humidity: Option<Level>,
    pub fire: FireLevel,
    pub motion: Option<Presence>,
    pub light: Option<DayPhase>,
}

impl AlertLabels {
    /// Names of labels that are in an alarm state now but were not in `previous`
    pub fn raised_since(&self, previous: &AlertLabels) -> Vec<&'static str> {
        let mut raised = Vec::new();
        if self.temperature == Some(Level::High) && previous.temperature != Some(Level::High) {
            raised.push("temperature");
        }
        if self.humidity == Some(Level::High) && previous.humidity != Some(Level::High) {
            raised.push("humidity");
        }
        if self.fire == FireLevel::Fire && previous.fire != FireLevel::Fire {
            raised.push("fire");
        }
        if self.motion == Some(Presence::Intruder) && previous.motion != Some(Presence::Intruder) {
            raised.push("motion");
        }
        raised
    }
}

impl Default for AlertLabels {
    fn default() -> Self {
        classify(&SensorState::default())
    }
}

/// Classify the sensor state against the fixed thresholds
pub fn classify(sensors: &SensorState) -> AlertLabels {
    let above = |reading: Option<f64>, threshold: f64| reading.map(|v| v > threshold);

    let smoke_fire = above(sensors.smoke, SMOKE_FIRE_PPM).unwrap_or(false);
    let gas_fire = sensors.gas_alert == Some(1.0);

    AlertLabels {
        temperature: above(sensors.temp, TEMPERATURE_HIGH_C).map(level),
        humidity: above(sensors.humidity, HUMIDITY_HIGH_PERCENT).map(level),
        fire: if smoke_fire || gas_fire {
            FireLevel::Fire
        } else {
            FireLevel::Normal
        },
        motion: sensors.motion.map(|m| {
            if m == 1.0 {
                Presence::Intruder
            } else {
                Presence::Clear
            }
        }),
        light: above(sensors.ldr, LIGHT_NIGHT_LEVEL).map(|night| {
            if night {
                DayPhase::Night
            } else {
                DayPhase::Day
            }
        }),
    }
}

fn level(high: bool) -> Level {
    if high {
        Level::High
    } else {
        Level::Normal
    }
}
