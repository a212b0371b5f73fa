//! Sensor and relay HTTP handlers.

use std::time::Duration;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{LevelSensor, Switch, Thermometer};
use crate::handlers::problem_details;
use crate::server::AppState;

// ============================================================================
// Climate
// ============================================================================

#[derive(Deserialize)]
pub struct ClimateQuery {
    timeout_seconds: Option<u64>,
}

/// Both fields are null when no reading arrived before the timeout.
#[derive(Serialize)]
pub struct ClimateResponse {
    humidity: Option<f64>,
    temperature: Option<f64>,
}

/// GET /api/v1/sensors/climate
///
/// Synchronous bounded-retry read. A timeout is "no data now", reported as
/// null fields, never as an error or a hang.
pub async fn read_climate(
    State(state): State<AppState>,
    Query(query): Query<ClimateQuery>,
) -> Response {
    let timeout_seconds = query.timeout_seconds.unwrap_or(state.read_timeout_seconds);
    if timeout_seconds == 0 {
        return problem_details::bad_request("timeout_seconds must be positive");
    }

    match state
        .devices
        .climate
        .read(Duration::from_secs(timeout_seconds))
        .await
    {
        Ok(Some(reading)) => Json(ClimateResponse {
            humidity: Some(reading.humidity),
            temperature: Some(reading.temperature),
        })
        .into_response(),
        Ok(None) => Json(ClimateResponse {
            humidity: None,
            temperature: None,
        })
        .into_response(),
        Err(e) => problem_details::internal_error(e.to_string()),
    }
}

#[derive(Serialize)]
pub struct LatestClimateResponse {
    humidity: f64,
    temperature: f64,
    read_at: DateTime<Utc>,
}

/// GET /api/v1/sensors/climate/latest
///
/// Most recent reading recorded by a `poll` job.
pub async fn latest_climate(State(state): State<AppState>) -> Response {
    let Some(reading) = state.latest_climate.get().await else {
        return problem_details::not_found("no climate reading recorded yet");
    };

    Json(LatestClimateResponse {
        humidity: reading.humidity,
        temperature: reading.temperature,
        read_at: reading.read_at,
    })
    .into_response()
}

// ============================================================================
// Water temperature and level
// ============================================================================

#[derive(Serialize)]
pub struct WaterTemperatureResponse {
    temperature: f64,
}

/// GET /api/v1/sensors/water-temperature
pub async fn read_water_temperature(State(state): State<AppState>) -> Response {
    match state.devices.water_temperature.read_celsius() {
        Ok(temperature) => Json(WaterTemperatureResponse {
            temperature: (temperature * 10.0).round() / 10.0,
        })
        .into_response(),
        Err(e) => problem_details::internal_error(e.to_string()),
    }
}

#[derive(Serialize)]
pub struct WaterLevelResponse {
    high: bool,
}

/// GET /api/v1/sensors/water-level
pub async fn read_water_level(State(state): State<AppState>) -> Json<WaterLevelResponse> {
    Json(WaterLevelResponse {
        high: state.devices.water_level.is_high(),
    })
}

// ============================================================================
// Relays
// ============================================================================

#[derive(Serialize)]
pub struct RelayStateResponse {
    id: String,
    power_state: bool,
}

#[derive(Serialize)]
pub struct RelaysResponse {
    relays: Vec<RelayStateResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerCommand {
    On,
    Off,
}

#[derive(Deserialize)]
pub struct SetRelayRequest {
    power: PowerCommand,
}

/// GET /api/v1/relays
pub async fn list_relays(State(state): State<AppState>) -> Json<RelaysResponse> {
    let relays = state
        .devices
        .relays
        .ids()
        .into_iter()
        .filter_map(|id| {
            state.devices.relays.get(&id).map(|relay| RelayStateResponse {
                power_state: relay.is_on(),
                id,
            })
        })
        .collect();

    Json(RelaysResponse { relays })
}

/// GET /api/v1/relays/{id}
pub async fn get_relay(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(relay) = state.devices.relays.get(&id) else {
        return problem_details::not_found(format!("relay '{id}' not found"));
    };

    (
        StatusCode::OK,
        Json(RelayStateResponse {
            power_state: relay.is_on(),
            id,
        }),
    )
        .into_response()
}

/// POST /api/v1/relays/{id}
pub async fn set_relay(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SetRelayRequest>,
) -> Response {
    let Some(relay) = state.devices.relays.get(&id) else {
        return problem_details::not_found(format!("relay '{id}' not found"));
    };

    match req.power {
        PowerCommand::On => relay.on(),
        PowerCommand::Off => relay.off(),
    }

    (
        StatusCode::OK,
        Json(RelayStateResponse {
            power_state: relay.is_on(),
            id,
        }),
    )
        .into_response()
}
