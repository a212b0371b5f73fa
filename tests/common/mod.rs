//! Common test utilities.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use growd::device::sim::{SimClimateSensor, SimLevelSensor, SimRelay, SimThermometer};
use growd::device::{ClimateSensor, LatestReading, RelayBank, Switch};
use growd::job::{self, JobRegistry, JobStore, Scheduler};
use growd::server::{self, AppState, Devices};

/// Create a test `AppState` over a tempdir store and simulated devices.
pub fn test_app_state() -> AppState {
    use tempfile::TempDir;

    let tmp = TempDir::new().unwrap();

    // Leak the TempDir so it doesn't get cleaned up during the test.
    // This is fine for tests - the OS will clean up on process exit.
    let tmp = Box::leak(Box::new(tmp));
    test_app_state_at(tmp.path().join("jobs"))
}

/// Create a test `AppState` over a specific jobs directory, for tests that
/// simulate a restart by building a second state on the same directory.
pub fn test_app_state_at(jobs_dir: std::path::PathBuf) -> AppState {
    let relays = RelayBank::new(
        ["pump", "lights"]
            .into_iter()
            .map(|id| (id.to_string(), SimRelay::new(id) as Arc<dyn Switch>))
            .collect::<HashMap<_, _>>(),
    );
    let climate = Arc::new(
        ClimateSensor::new(SimClimateSensor::new(), SimRelay::new("climate-power"))
            .with_settle(Duration::from_millis(10)),
    );
    let latest_climate = LatestReading::new();

    let mut registry = JobRegistry::new();
    registry
        .register(job::cycle::JOB_TYPE, job::cycle::relay_cycle(relays.clone()))
        .unwrap();
    registry
        .register(
            job::poll::JOB_TYPE,
            job::poll::climate_poll(climate.clone(), latest_climate.clone()),
        )
        .unwrap();

    let scheduler = Scheduler::new(JobStore::new(jobs_dir), Arc::new(registry));

    AppState {
        scheduler,
        devices: Devices {
            relays,
            climate,
            water_temperature: SimThermometer::new(19.23),
            water_level: SimLevelSensor::new(true),
        },
        latest_climate,
        read_timeout_seconds: 2,
    }
}

/// Create a test app with simulated devices.
pub fn test_app() -> Router {
    server::build_app(test_app_state(), 30)
}
