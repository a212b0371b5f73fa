//! Simulated devices.
//!
//! Back the default binary on machines without wired hardware and double as
//! test fixtures. State changes are logged so simulated runs stay
//! observable.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::{ClimateSample, DeviceError, LevelSensor, RawClimateSensor, SampleError, Switch, Thermometer};

/// In-memory relay. Tracks its on/off state and logs transitions.
pub struct SimRelay {
    id: String,
    on: AtomicBool,
}

impl SimRelay {
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            on: AtomicBool::new(false),
        })
    }
}

impl Switch for SimRelay {
    fn on(&self) {
        self.on.store(true, Ordering::SeqCst);
        debug!(relay = %self.id, "relay on");
    }

    fn off(&self) {
        self.on.store(false, Ordering::SeqCst);
        debug!(relay = %self.id, "relay off");
    }

    fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}

/// Climate sensor that always produces the same complete sample.
pub struct SimClimateSensor {
    humidity: f64,
    temperature: f64,
}

impl SimClimateSensor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            humidity: 55.0,
            temperature: 21.5,
        })
    }
}

impl RawClimateSensor for SimClimateSensor {
    fn sample(&self) -> Result<ClimateSample, SampleError> {
        Ok(ClimateSample {
            humidity: Some(self.humidity),
            temperature: Some(self.temperature),
        })
    }
}

/// Thermometer pinned to a fixed temperature.
pub struct SimThermometer {
    temperature: f64,
}

impl SimThermometer {
    pub fn new(temperature: f64) -> Arc<Self> {
        Arc::new(Self { temperature })
    }
}

impl Thermometer for SimThermometer {
    fn read_celsius(&self) -> Result<f64, DeviceError> {
        Ok(self.temperature)
    }
}

/// Level sensor with a settable state.
pub struct SimLevelSensor {
    high: AtomicBool,
}

impl SimLevelSensor {
    pub fn new(high: bool) -> Arc<Self> {
        Arc::new(Self {
            high: AtomicBool::new(high),
        })
    }

    pub fn set_high(&self, high: bool) {
        self.high.store(high, Ordering::SeqCst);
    }
}

impl LevelSensor for SimLevelSensor {
    fn is_high(&self) -> bool {
        self.high.load(Ordering::SeqCst)
    }
}
