//! BDD step definitions for actuator command feature

use std::time::Duration;

use cucumber::{given, then, when};

use homesync::snapshot::{Actuator, Switch};
use homesync::store::Scalar;

use crate::world::HomeSyncWorld;

fn parse_actuator(name: &str) -> Actuator {
    name.parse()
        .unwrap_or_else(|_| panic!("Unknown actuator: {}", name))
}

#[given("the store rejects writes")]
fn store_rejects_writes(world: &mut HomeSyncWorld) {
    world.store().set_fail_writes(true);
}

#[when(expr = "actuator {string} is toggled")]
async fn actuator_toggled(world: &mut HomeSyncWorld, name: String) {
    let actuator = parse_actuator(&name);
    match world.session().toggle(actuator).await {
        Ok(pending) => world.pending = Some(pending),
        Err(e) => world.command_error = Some(e),
    }
}

#[when(expr = "actuator {string} is set to {int}")]
async fn actuator_set(world: &mut HomeSyncWorld, name: String, value: u8) {
    let actuator = parse_actuator(&name);
    let value = Switch::try_from(value).expect("actuator values are 0 or 1");
    match world.session().set(actuator, value).await {
        Ok(pending) => world.pending = Some(pending),
        Err(e) => world.command_error = Some(e),
    }
}

#[when("the write is answered")]
async fn write_answered(world: &mut HomeSyncWorld) {
    let pending = world.pending.take().expect("no pending write");
    world.acknowledged = Some(pending.acknowledged().await);
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[then(expr = "a write of {int} to {string} should be issued")]
fn write_issued(world: &mut HomeSyncWorld, value: u8, path: String) {
    let pending = world.pending.as_ref().expect("no pending write");
    assert_eq!(pending.path, path);
    assert_eq!(pending.value.as_u8(), value);
}

#[then(expr = "the store should have recorded {int} at {string}")]
async fn store_recorded(world: &mut HomeSyncWorld, value: i64, path: String) {
    let writes = world.store().writes().await;
    assert!(
        writes.contains(&(path.clone(), Scalar(value))),
        "Expected write {} = {}, recorded writes: {:?}",
        path,
        value,
        writes
    );
}

#[then("the write should be acknowledged")]
fn write_acknowledged(world: &mut HomeSyncWorld) {
    assert_eq!(world.acknowledged, Some(true));
}

#[then("the write should not be acknowledged")]
fn write_not_acknowledged(world: &mut HomeSyncWorld) {
    assert_eq!(world.acknowledged, Some(false));
}

#[then(expr = "the command should fail with {string}")]
fn command_should_fail(world: &mut HomeSyncWorld, expected: String) {
    let error = world.command_error.as_ref().expect("command did not fail");
    assert!(
        error.to_string().contains(&expected),
        "Expected error containing '{}', got '{}'",
        expected,
        error
    );
}
