//! JSON API over the sync session for presentation layers

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::dispatcher::PendingWrite;
use crate::error::HomeSyncError;
use crate::session::SyncSession;
use crate::snapshot::{Actuator, Switch};

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub session: Arc<SyncSession>,
}

/// Body of an explicit actuator write; any number is accepted here and
/// checked against 0/1 by the handler
#[derive(Debug, Deserialize)]
pub struct SetRequest {
    pub value: f64,
}

/// Describes a write that was issued to the store
#[derive(Debug, Serialize)]
pub struct IssuedWrite {
    pub actuator: Actuator,
    pub value: Switch,
    pub path: String,
}

impl From<&PendingWrite> for IssuedWrite {
    fn from(pending: &PendingWrite) -> Self {
        Self {
            actuator: pending.actuator,
            value: pending.value,
            path: pending.path.clone(),
        }
    }
}

/// Build the dashboard axum router
pub fn build_router(session: Arc<SyncSession>) -> Router {
    let dashboard_state = DashboardState { session };

    Router::new()
        .route("/api/state", get(state_handler))
        .route("/api/devices/{actuator}", put(set_handler))
        .route("/api/devices/{actuator}/toggle", post(toggle_handler))
        .route("/health", get(health_handler))
        .with_state(dashboard_state)
}

async fn state_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.session.view().await)
}

async fn toggle_handler(
    State(dashboard): State<DashboardState>,
    Path(actuator): Path<String>,
) -> Response {
    let actuator = match actuator.parse::<Actuator>() {
        Ok(actuator) => actuator,
        Err(e) => return error_response(e),
    };

    // The write completes in the background; the next snapshot reflects it
    match dashboard.session.toggle(actuator).await {
        Ok(pending) => (StatusCode::ACCEPTED, Json(IssuedWrite::from(&pending))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn set_handler(
    State(dashboard): State<DashboardState>,
    Path(actuator): Path<String>,
    request: std::result::Result<Json<SetRequest>, JsonRejection>,
) -> Response {
    let actuator = match actuator.parse::<Actuator>() {
        Ok(actuator) => actuator,
        Err(e) => return error_response(e),
    };
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return (StatusCode::BAD_REQUEST, rejection.body_text()).into_response();
        }
    };
    let Some(value) = Switch::from_number(request.value) else {
        return (
            StatusCode::BAD_REQUEST,
            format!("value must be 0 or 1, got {}", request.value),
        )
            .into_response();
    };

    match dashboard.session.set(actuator, value).await {
        Ok(pending) => (StatusCode::ACCEPTED, Json(IssuedWrite::from(&pending))).into_response(),
        Err(e) => error_response(e),
    }
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}

fn error_response(error: HomeSyncError) -> Response {
    let status = match error {
        HomeSyncError::UnknownActuator(_) => StatusCode::NOT_FOUND,
        HomeSyncError::SessionStopped => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, error.to_string()).into_response()
}
