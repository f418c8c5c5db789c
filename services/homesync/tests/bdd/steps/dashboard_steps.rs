//! BDD step definitions for dashboard feature

use axum::body::Body;
use axum::http::Request;
use cucumber::{then, when};
use tower::ServiceExt;

use homesync::dashboard::build_router;

use crate::world::HomeSyncWorld;

async fn send(world: &mut HomeSyncWorld, request: Request<Body>) {
    let app = build_router(world.session());
    let response = app.oneshot(request).await.unwrap();
    world.response_status = Some(response.status().as_u16());

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    world.response_body = serde_json::from_slice(&body).ok();
}

#[when(expr = "I GET {string}")]
async fn get_path(world: &mut HomeSyncWorld, path: String) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(world, request).await;
}

#[when(expr = "I POST {string}")]
async fn post_path(world: &mut HomeSyncWorld, path: String) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .body(Body::empty())
        .unwrap();
    send(world, request).await;
}

#[when(expr = "I PUT {string} with body {string}")]
async fn put_path(world: &mut HomeSyncWorld, path: String, body: String) {
    let request = Request::builder()
        .method("PUT")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    send(world, request).await;
}

#[then(expr = "the response status should be {int}")]
fn response_status(world: &mut HomeSyncWorld, expected: u16) {
    assert_eq!(world.response_status, Some(expected));
}

#[then(expr = "the response field {string} should be {string}")]
fn response_field(world: &mut HomeSyncWorld, pointer: String, expected: String) {
    let body = world.response_body.as_ref().expect("response was not JSON");
    let actual = body
        .pointer(&pointer)
        .unwrap_or_else(|| panic!("no field at {} in {}", pointer, body));
    let actual = match actual {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    assert_eq!(actual, expected);
}
