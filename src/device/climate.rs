//! Bounded-retry read protocol for the warm-up-sensitive climate sensor.
//!
//! The hardware needs a settle delay after power-on before a sample can be
//! trusted; sampling earlier returns the previous power-cycle's stale
//! reading. Transient failures are retried until a deadline, fatal ones
//! abort immediately, and a timeout is a value, not an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tracing::debug;

use super::{DeviceError, RawClimateSensor, Reading, SampleError, Switch};

/// Mandatory warm-up before a sample is trusted. This is a hardware quirk,
/// not a tunable: shorter waits yield stale data from before the most
/// recent power-on.
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(3);

/// Climate sensor with managed power and bounded retries.
pub struct ClimateSensor {
    raw: Arc<dyn RawClimateSensor>,
    power: Arc<dyn Switch>,
    settle: Duration,
}

impl ClimateSensor {
    pub fn new(raw: Arc<dyn RawClimateSensor>, power: Arc<dyn Switch>) -> Self {
        Self {
            raw,
            power,
            settle: DEFAULT_SETTLE,
        }
    }

    /// Override the settle interval. Intended for tests and for hardware
    /// revisions with a documented different warm-up.
    pub fn with_settle(self, settle: Duration) -> Self {
        Self { settle, ..self }
    }

    /// Read the sensor, retrying transient failures until `timeout`.
    ///
    /// Powers the sensor on if it was off and, on success, restores its
    /// original power state. Returns `Ok(None)` once `timeout` has elapsed
    /// without a complete reading; the overshoot past the deadline is at
    /// most one settle interval. A fatal sample failure propagates
    /// immediately as [`DeviceError::Sensor`].
    pub async fn read(&self, timeout: Duration) -> Result<Option<Reading>, DeviceError> {
        let was_on = self.power.is_on();
        self.power.on();

        let deadline = Instant::now() + timeout;
        loop {
            tokio::time::sleep(self.settle).await;

            match self.raw.sample() {
                Ok(sample) => {
                    if let (Some(humidity), Some(temperature)) =
                        (sample.humidity, sample.temperature)
                    {
                        if !was_on {
                            self.power.off();
                        }
                        return Ok(Some(Reading {
                            humidity,
                            temperature,
                            read_at: Utc::now(),
                        }));
                    }
                    debug!("incomplete climate sample, retrying");
                }
                Err(SampleError::Transient(reason)) => {
                    debug!(reason = %reason, "transient climate read failure, retrying");
                }
                Err(SampleError::Fatal(reason)) => {
                    return Err(DeviceError::Sensor(reason));
                }
            }

            if Instant::now() >= deadline {
                debug!(timeout_secs = timeout.as_secs(), "climate read timed out");
                return Ok(None);
            }
        }
    }
}
