//! Device capabilities consumed by jobs and handlers.
//!
//! The controller owns trait objects, not drivers: real GPIO/I2C/1-wire
//! bindings live behind `Switch`, `RawClimateSensor`, `Thermometer` and
//! `LevelSensor`, and the `sim` implementations back the default binary and
//! the tests.

mod climate;
pub mod sim;

pub use climate::{ClimateSensor, DEFAULT_SETTLE};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;

// ============================================================================
// Capabilities
// ============================================================================

/// A binary actuator (relay, power pin).
pub trait Switch: Send + Sync {
    fn on(&self);
    fn off(&self);
    fn is_on(&self) -> bool;
}

/// Raw combined humidity/temperature sensor.
///
/// A single attempt; retry policy lives in [`ClimateSensor`].
pub trait RawClimateSensor: Send + Sync {
    fn sample(&self) -> Result<ClimateSample, SampleError>;
}

/// One-shot temperature probe.
pub trait Thermometer: Send + Sync {
    fn read_celsius(&self) -> Result<f64, DeviceError>;
}

/// Binary level sensor (e.g., water reservoir float).
pub trait LevelSensor: Send + Sync {
    fn is_high(&self) -> bool;
}

// ============================================================================
// Sample and reading types
// ============================================================================

/// Raw output of one sample attempt. Either field may be absent; a reading
/// is only trusted once both are present.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClimateSample {
    pub humidity: Option<f64>,
    pub temperature: Option<f64>,
}

/// A complete, trusted climate reading.
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub humidity: f64,
    pub temperature: f64,
    pub read_at: DateTime<Utc>,
}

/// Shared cell holding the most recent climate reading, refreshed by the
/// poll job and served by the HTTP layer.
#[derive(Clone, Default)]
pub struct LatestReading {
    inner: Arc<RwLock<Option<Reading>>>,
}

impl LatestReading {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, reading: Reading) {
        *self.inner.write().await = Some(reading);
    }

    pub async fn get(&self) -> Option<Reading> {
        self.inner.read().await.clone()
    }
}

// ============================================================================
// Relay bank
// ============================================================================

/// The configured id -> switch map, shared across jobs and handlers.
#[derive(Clone, Default)]
pub struct RelayBank {
    relays: Arc<HashMap<String, Arc<dyn Switch>>>,
}

impl RelayBank {
    pub fn new(relays: HashMap<String, Arc<dyn Switch>>) -> Self {
        Self {
            relays: Arc::new(relays),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Switch>> {
        self.relays.get(id).cloned()
    }

    /// Configured relay ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.relays.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Outcome of a failed raw sample attempt.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Expected occasionally from the hardware; the read protocol retries.
    #[error("transient read failure: {0}")]
    Transient(String),

    /// Anything else; aborts the read immediately.
    #[error("sensor failure: {0}")]
    Fatal(String),
}

/// Device-level failure surfaced to callers.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("sensor failure: {0}")]
    Sensor(String),
}
