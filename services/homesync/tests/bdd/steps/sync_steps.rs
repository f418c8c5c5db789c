//! BDD step definitions for state synchronization feature

use std::sync::Arc;
use std::time::Duration;

use cucumber::{given, then, when};

use homesync::config::PathsConfig;
use homesync::snapshot::{Actuator, Sensor, Switch};
use homesync::store::MemoryStore;
use homesync::SyncSession;

use crate::world::HomeSyncWorld;

fn parse_json(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|e| panic!("invalid JSON {}: {}", raw, e))
}

fn parse_actuator(name: &str) -> Actuator {
    name.parse()
        .unwrap_or_else(|_| panic!("Unknown actuator: {}", name))
}

fn parse_sensor(name: &str) -> Sensor {
    Sensor::ALL
        .into_iter()
        .find(|s| s.key() == name)
        .unwrap_or_else(|| panic!("Unknown sensor: {}", name))
}

/// Let the apply tasks drain whatever the store has delivered
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

// --- Given steps ---

#[given(expr = "the store holds {string} at {string}")]
async fn store_holds(world: &mut HomeSyncWorld, raw: String, path: String) {
    let store = world
        .store
        .get_or_insert_with(|| Arc::new(MemoryStore::new()))
        .clone();
    store.put(&path, parse_json(&raw)).await;
}

#[given("a sync session on the store")]
fn session_on_store(world: &mut HomeSyncWorld) {
    let store = world
        .store
        .get_or_insert_with(|| Arc::new(MemoryStore::new()))
        .clone();
    world.session = Some(Arc::new(SyncSession::new(store, PathsConfig::default())));
}

#[given("a running sync session")]
async fn running_session(world: &mut HomeSyncWorld) {
    session_on_store(world);
    world.session().start().await.expect("session failed to start");
    settle().await;
}

// --- When steps ---

#[when("the session is started")]
async fn session_started(world: &mut HomeSyncWorld) {
    world.last_start = Some(world.session().start().await);
    settle().await;
}

#[when("the session is started again")]
async fn session_started_again(world: &mut HomeSyncWorld) {
    world.last_start = Some(world.session().start().await);
}

#[when("the session is stopped")]
async fn session_stopped(world: &mut HomeSyncWorld) {
    world.session().stop().await;
}

#[when(expr = "the store publishes {string} at {string}")]
async fn store_publishes(world: &mut HomeSyncWorld, raw: String, path: String) {
    world.store().put(&path, parse_json(&raw)).await;
    settle().await;
}

// --- Then steps ---

#[then(expr = "actuator {string} should be {int}")]
async fn actuator_should_be(world: &mut HomeSyncWorld, name: String, expected: u8) {
    let view = world.session().view().await;
    let expected = Switch::try_from(expected).expect("actuator values are 0 or 1");
    assert_eq!(view.actuators.get(parse_actuator(&name)), expected);
}

#[then(expr = "sensor {string} should be {float}")]
async fn sensor_should_be(world: &mut HomeSyncWorld, name: String, expected: f64) {
    let view = world.session().view().await;
    assert_eq!(view.sensors.get(parse_sensor(&name)), Some(expected));
}

#[then(expr = "sensor {string} should be unknown")]
async fn sensor_should_be_unknown(world: &mut HomeSyncWorld, name: String) {
    let view = world.session().view().await;
    assert_eq!(view.sensors.get(parse_sensor(&name)), None);
}

fn label_text<T: ToString>(label: Option<T>) -> String {
    label
        .map(|l| l.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[then(expr = "the dashboard temperature label should be {string}")]
async fn dashboard_temperature_label(world: &mut HomeSyncWorld, expected: String) {
    let view = world.session().view().await;
    assert_eq!(label_text(view.alerts.temperature), expected);
}

#[then(expr = "the dashboard humidity label should be {string}")]
async fn dashboard_humidity_label(world: &mut HomeSyncWorld, expected: String) {
    let view = world.session().view().await;
    assert_eq!(label_text(view.alerts.humidity), expected);
}

#[then(expr = "the dashboard motion label should be {string}")]
async fn dashboard_motion_label(world: &mut HomeSyncWorld, expected: String) {
    let view = world.session().view().await;
    assert_eq!(label_text(view.alerts.motion), expected);
}

#[then(expr = "the dashboard light label should be {string}")]
async fn dashboard_light_label(world: &mut HomeSyncWorld, expected: String) {
    let view = world.session().view().await;
    assert_eq!(label_text(view.alerts.light), expected);
}

#[then(expr = "the dashboard fire label should be {string}")]
async fn dashboard_fire_label(world: &mut HomeSyncWorld, expected: String) {
    let view = world.session().view().await;
    assert_eq!(view.alerts.fire.to_string(), expected);
}

#[then("the session should be running")]
async fn session_should_be_running(world: &mut HomeSyncWorld) {
    assert!(world.session().is_running().await);
    assert_eq!(world.session().subscribed_groups().await.len(), 2);
}

#[then("the session should not be running")]
async fn session_should_not_be_running(world: &mut HomeSyncWorld) {
    assert!(!world.session().is_running().await);
}

#[then(expr = "the store should have {int} subscribers")]
async fn store_subscribers(world: &mut HomeSyncWorld, expected: usize) {
    assert_eq!(world.store().subscriber_count().await, expected);
}

#[then(expr = "starting should fail with {string}")]
fn start_should_fail(world: &mut HomeSyncWorld, expected: String) {
    match world.last_start.as_ref().expect("session not started") {
        Ok(()) => panic!("Expected start to fail with '{}'", expected),
        Err(e) => assert!(
            e.to_string().contains(&expected),
            "Expected error containing '{}', got '{}'",
            expected,
            e
        ),
    }
}
