//! BDD step definitions for alert classification feature

use cucumber::{given, then, when};

use homesync::alerts::classify;
use homesync::state::SensorState;

use crate::world::HomeSyncWorld;

fn label_text<T: ToString>(label: Option<T>) -> String {
    label.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string())
}

#[given("no sensor readings")]
fn no_sensor_readings(world: &mut HomeSyncWorld) {
    world.sensors = SensorState::default();
}

#[given(expr = "a temperature reading of {float}")]
fn temperature_reading(world: &mut HomeSyncWorld, value: f64) {
    world.sensors.temp = Some(value);
}

#[given(expr = "a humidity reading of {float}")]
fn humidity_reading(world: &mut HomeSyncWorld, value: f64) {
    world.sensors.humidity = Some(value);
}

#[given(expr = "a smoke reading of {float}")]
fn smoke_reading(world: &mut HomeSyncWorld, value: f64) {
    world.sensors.smoke = Some(value);
}

#[given(expr = "a gas alert flag of {float}")]
fn gas_alert_flag(world: &mut HomeSyncWorld, value: f64) {
    world.sensors.gas_alert = Some(value);
}

#[given(expr = "a motion reading of {float}")]
fn motion_reading(world: &mut HomeSyncWorld, value: f64) {
    world.sensors.motion = Some(value);
}

#[given(expr = "a light level of {float}")]
fn light_level(world: &mut HomeSyncWorld, value: f64) {
    world.sensors.ldr = Some(value);
}

#[when("the alerts are classified")]
fn alerts_classified(world: &mut HomeSyncWorld) {
    world.labels = Some(classify(&world.sensors));
}

#[then(expr = "the temperature label should be {string}")]
fn temperature_label(world: &mut HomeSyncWorld, expected: String) {
    let labels = world.labels.expect("alerts not classified");
    assert_eq!(label_text(labels.temperature), expected);
}

#[then(expr = "the humidity label should be {string}")]
fn humidity_label(world: &mut HomeSyncWorld, expected: String) {
    let labels = world.labels.expect("alerts not classified");
    assert_eq!(label_text(labels.humidity), expected);
}

#[then(expr = "the fire label should be {string}")]
fn fire_label(world: &mut HomeSyncWorld, expected: String) {
    let labels = world.labels.expect("alerts not classified");
    assert_eq!(labels.fire.to_string(), expected);
}

#[then(expr = "the motion label should be {string}")]
fn motion_label(world: &mut HomeSyncWorld, expected: String) {
    let labels = world.labels.expect("alerts not classified");
    assert_eq!(label_text(labels.motion), expected);
}

#[then(expr = "the light label should be {string}")]
fn light_label(world: &mut HomeSyncWorld, expected: String) {
    let labels = world.labels.expect("alerts not classified");
    assert_eq!(label_text(labels.light), expected);
}
