use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::timeout::TimeoutLayer;

use crate::device::{ClimateSensor, LatestReading, LevelSensor, RelayBank, Thermometer};
use crate::handlers;
use crate::job::Scheduler;

// ============================================================================
// Application State
// ============================================================================

/// Device handles owned by the application and injected into handlers and
/// job functions.
#[derive(Clone)]
pub struct Devices {
    pub relays: RelayBank,
    pub climate: Arc<ClimateSensor>,
    pub water_temperature: Arc<dyn Thermometer>,
    pub water_level: Arc<dyn LevelSensor>,
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Scheduler,
    pub devices: Devices,
    pub latest_climate: LatestReading,
    /// Default ceiling for synchronous climate reads, in seconds.
    pub read_timeout_seconds: u64,
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    let api_v1 = Router::new()
        .route(
            "/jobs",
            get(handlers::list_jobs).post(handlers::start_job),
        )
        .route(
            "/jobs/{id}",
            get(handlers::get_job).delete(handlers::stop_job),
        )
        .route("/sensors/climate", get(handlers::read_climate))
        .route("/sensors/climate/latest", get(handlers::latest_climate))
        .route(
            "/sensors/water-temperature",
            get(handlers::read_water_temperature),
        )
        .route("/sensors/water-level", get(handlers::read_water_level))
        .route("/relays", get(handlers::list_relays))
        .route(
            "/relays/{id}",
            get(handlers::get_relay).post(handlers::set_relay),
        )
        .with_state(state);

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/version", get(handlers::version))
        .nest("/api/v1", api_v1)
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
}
