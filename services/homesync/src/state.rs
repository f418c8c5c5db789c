//! Shared state for actuator and sensor values

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::alerts::{classify, AlertLabels};
use crate::snapshot::{Actuator, FieldUpdate, Sensor, Switch};

/// Last-known value of every actuator
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActuatorState {
    pub servo: Switch,
    pub relay: Switch,
    pub led: Switch,
    pub remote: Switch,
}

impl ActuatorState {
    pub fn get(&self, actuator: Actuator) -> Switch {
        match actuator {
            Actuator::Servo => self.servo,
            Actuator::Relay => self.relay,
            Actuator::Led => self.led,
            Actuator::Remote => self.remote,
        }
    }

    fn slot(&mut self, actuator: Actuator) -> &mut Switch {
        match actuator {
            Actuator::Servo => &mut self.servo,
            Actuator::Relay => &mut self.relay,
            Actuator::Led => &mut self.led,
            Actuator::Remote => &mut self.remote,
        }
    }
}

/// Last-known sensor readings; `None` until the first valid value arrives
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub temp: Option<f64>,
    pub humidity: Option<f64>,
    pub smoke: Option<f64>,
    pub motion: Option<f64>,
    pub ldr: Option<f64>,
    pub gas_alert: Option<f64>,
}

impl SensorState {
    pub fn get(&self, sensor: Sensor) -> Option<f64> {
        match sensor {
            Sensor::Temp => self.temp,
            Sensor::Humidity => self.humidity,
            Sensor::Smoke => self.smoke,
            Sensor::Motion => self.motion,
            Sensor::Ldr => self.ldr,
            Sensor::GasAlert => self.gas_alert,
        }
    }

    fn slot(&mut self, sensor: Sensor) -> &mut Option<f64> {
        match sensor {
            Sensor::Temp => &mut self.temp,
            Sensor::Humidity => &mut self.humidity,
            Sensor::Smoke => &mut self.smoke,
            Sensor::Motion => &mut self.motion,
            Sensor::Ldr => &mut self.ldr,
            Sensor::GasAlert => &mut self.gas_alert,
        }
    }
}

/// Result of applying one field update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Changed,
    Unchanged,
    /// The state was disposed; nothing was applied
    Disposed,
}

/// A consistent copy of the state plus its derived labels
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateView {
    pub actuators: ActuatorState,
    pub sensors: SensorState,
    pub alerts: AlertLabels,
    pub last_update_epoch_ms: Option<u64>,
}

/// Shared state written by the subscription tasks and read by everyone else
#[derive(Debug, Default)]
pub struct SharedState {
    pub actuators: ActuatorState,
    pub sensors: SensorState,
    pub last_update_epoch_ms: Option<u64>,
    pub updates_applied: u64,
    disposed: bool,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a validated update. Last applied wins; fields are independent.
    pub fn apply_update(&mut self, update: FieldUpdate, now_ms: u64) -> ApplyOutcome {
        if self.disposed {
            return ApplyOutcome::Disposed;
        }

        let changed = match update {
            FieldUpdate::Actuator(actuator, value) => {
                let slot = self.actuators.slot(actuator);
                let changed = *slot != value;
                *slot = value;
                changed
            }
            FieldUpdate::Sensor(sensor, value) => {
                let slot = self.sensors.slot(sensor);
                let changed = *slot != Some(value);
                *slot = Some(value);
                changed
            }
        };

        self.updates_applied += 1;
        self.last_update_epoch_ms = Some(now_ms);

        if changed {
            ApplyOutcome::Changed
        } else {
            ApplyOutcome::Unchanged
        }
    }

    pub fn actuator(&self, actuator: Actuator) -> Switch {
        self.actuators.get(actuator)
    }

    pub fn sensor(&self, sensor: Sensor) -> Option<f64> {
        self.sensors.get(sensor)
    }

    pub fn alerts(&self) -> AlertLabels {
        classify(&self.sensors)
    }

    pub fn view(&self) -> StateView {
        StateView {
            actuators: self.actuators,
            sensors: self.sensors,
            alerts: self.alerts(),
            last_update_epoch_ms: self.last_update_epoch_ms,
        }
    }

    /// Reject every later update
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Thread-safe shared state handle
pub type StateHandle = Arc<RwLock<SharedState>>;

pub fn new_state_handle() -> StateHandle {
    Arc::new(RwLock::new(SharedState::new()))
}
