//! Relay power-cycle job.
//!
//! Drives a relay on for `on_seconds`, off for `off_seconds`, forever.
//! Cancellation is observed at the sleeps, and the relay is always driven
//! off before the job resolves, whichever phase was interrupted.

use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, info};

use super::definition::{require_secs, require_str};
use super::error::JobError;
use super::registry::JobFn;
use crate::device::{RelayBank, Switch};

/// Job-type name under which this function is registered.
pub const JOB_TYPE: &str = "cycle";

/// Build the `cycle` job function over a relay bank.
///
/// Params: `relay` (a configured relay id), `on_seconds` and `off_seconds`
/// (positive).
pub fn relay_cycle(relays: RelayBank) -> JobFn {
    Arc::new(move |params, cancel| {
        let relay_id = require_str(params, "relay")?.to_string();
        let relay = relays
            .get(&relay_id)
            .ok_or_else(|| JobError::InvalidParams(format!("unknown relay '{relay_id}'")))?;
        let on_duration = require_secs(params, "on_seconds")?;
        let off_duration = require_secs(params, "off_seconds")?;

        Ok(async move {
            loop {
                relay.on();
                debug!(relay = %relay_id, "cycle: on");
                tokio::select! {
                    _ = tokio::time::sleep(on_duration) => {}
                    _ = cancel.cancelled() => break,
                }

                relay.off();
                debug!(relay = %relay_id, "cycle: off");
                tokio::select! {
                    _ = tokio::time::sleep(off_duration) => {}
                    _ = cancel.cancelled() => break,
                }
            }

            // Safe state on exit, regardless of which phase was interrupted.
            relay.off();
            info!(relay = %relay_id, "cycle loop stopped");
        }
        .boxed())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Switch;
    use crate::device::sim::SimRelay;
    use crate::job::definition::{JobParams, ParamValue};
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn bank_with(relay: Arc<SimRelay>) -> RelayBank {
        let mut relays: HashMap<String, Arc<dyn Switch>> = HashMap::new();
        relays.insert("pump".to_string(), relay);
        RelayBank::new(relays)
    }

    fn cycle_params(on_secs: i64, off_secs: i64) -> JobParams {
        [
            ("relay".to_string(), ParamValue::Str("pump".to_string())),
            ("on_seconds".to_string(), ParamValue::Int(on_secs)),
            ("off_seconds".to_string(), ParamValue::Int(off_secs)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn rejects_missing_and_unknown_relay() {
        let func = relay_cycle(bank_with(SimRelay::new("pump")));

        let mut params = cycle_params(2, 3);
        params.insert("relay".to_string(), ParamValue::Str("lights".to_string()));
        assert!(matches!(
            func(&params, CancellationToken::new()),
            Err(JobError::InvalidParams(_))
        ));

        params.remove("relay");
        assert!(matches!(
            func(&params, CancellationToken::new()),
            Err(JobError::InvalidParams(_))
        ));
    }

    #[test]
    fn rejects_non_positive_durations() {
        let func = relay_cycle(bank_with(SimRelay::new("pump")));
        let params = cycle_params(0, 3);

        assert!(matches!(
            func(&params, CancellationToken::new()),
            Err(JobError::InvalidParams(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn alternates_phases_on_schedule() {
        let relay = SimRelay::new("pump");
        let func = relay_cycle(bank_with(relay.clone()));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(func(&cycle_params(2, 3), cancel.clone()).unwrap());

        // Into the on phase.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(relay.is_on());

        // Past the on phase, into the off phase (3.5s total).
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!relay.is_on());

        // Wrapped around into the next on phase (6s total).
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(relay.is_on());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_on_phase_drives_relay_off() {
        let relay = SimRelay::new("pump");
        let func = relay_cycle(bank_with(relay.clone()));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(func(&cycle_params(60, 60), cancel.clone()).unwrap());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(relay.is_on());

        cancel.cancel();
        handle.await.unwrap();
        assert!(!relay.is_on());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_off_phase_leaves_relay_off() {
        let relay = SimRelay::new("pump");
        let func = relay_cycle(bank_with(relay.clone()));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(func(&cycle_params(1, 60), cancel.clone()).unwrap());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!relay.is_on());

        cancel.cancel();
        handle.await.unwrap();
        assert!(!relay.is_on());
    }
}
