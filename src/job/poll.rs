//! Climate polling job.
//!
//! Reads the climate sensor on a fixed interval and refreshes the shared
//! latest-reading cell. A timed-out read is "no data now", not a failure;
//! a fatal read error is logged and the next tick tries again.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, info, warn};

use super::definition::{optional_secs, require_secs};
use super::registry::JobFn;
use crate::device::{ClimateSensor, LatestReading};

/// Job-type name under which this function is registered.
pub const JOB_TYPE: &str = "poll";

/// Default ceiling for one poll read.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Build the `poll` job function over the climate sensor.
///
/// Params: `interval_seconds` (positive), optional `timeout_seconds`.
pub fn climate_poll(sensor: Arc<ClimateSensor>, latest: LatestReading) -> JobFn {
    Arc::new(move |params, cancel| {
        let interval = require_secs(params, "interval_seconds")?;
        let timeout = optional_secs(params, "timeout_seconds", DEFAULT_READ_TIMEOUT)?;

        let sensor = sensor.clone();
        let latest = latest.clone();
        Ok(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = cancel.cancelled() => break,
                }

                // The read is bounded by its timeout, so cancellation latency
                // here is at most timeout plus one settle interval.
                match sensor.read(timeout).await {
                    Ok(Some(reading)) => {
                        info!(
                            humidity = reading.humidity,
                            temperature = reading.temperature,
                            "climate reading"
                        );
                        latest.set(reading).await;
                    }
                    Ok(None) => {
                        warn!(timeout_secs = timeout.as_secs(), "climate poll timed out");
                    }
                    Err(e) => {
                        error!(error = %e, "climate poll failed");
                    }
                }
            }
            info!("climate poll stopped");
        }
        .boxed())
    })
}
