//! Job lifecycle orchestration.
//!
//! The scheduler enforces the at-most-one-running-job-per-id invariant,
//! persists every job before launching it, and rebuilds the running set from
//! the durable store on startup. Cancellation is cooperative and confirmed:
//! `stop` does not return until the job's cleanup has executed.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::definition::{JobDefinition, JobParams};
use super::error::{JobError, Result};
use super::registry::JobRegistry;
use super::store::JobStore;

/// Live handle to an executing job function.
struct RunningJob {
    job_type: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Externally observable status of a job id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Stopped,
    /// Persisted record whose job type can no longer be resolved; kept in
    /// the store, not relaunched.
    Orphaned,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Stopped => write!(f, "stopped"),
            JobStatus::Orphaned => write!(f, "orphaned"),
        }
    }
}

/// Outcome of a `stop` call. Stopping an id with no running job is benign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

/// Read-only view of one job, served from the durable store.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub params: JobParams,
}

/// Result of job recovery on startup.
#[derive(Debug, Default)]
pub struct RecoveryResult {
    /// Number of jobs relaunched from the store.
    pub recovered: usize,
    /// Records kept but not relaunched (unregistered type, bad params).
    pub orphaned: usize,
    /// Unreadable records (job id, error message).
    pub errors: Vec<(String, String)>,
}

/// Orchestrates job lifecycle over an injected store and registry.
#[derive(Clone)]
pub struct Scheduler {
    store: JobStore,
    registry: Arc<JobRegistry>,
    running: Arc<Mutex<HashMap<String, RunningJob>>>,
    orphaned: Arc<RwLock<BTreeSet<String>>>,
}

impl Scheduler {
    pub fn new(store: JobStore, registry: Arc<JobRegistry>) -> Self {
        Self {
            store,
            registry,
            running: Arc::new(Mutex::new(HashMap::new())),
            orphaned: Arc::new(RwLock::new(BTreeSet::new())),
        }
    }

    /// Start a job under the given id.
    ///
    /// Idempotent: if a job is already running under this id, its status is
    /// returned and nothing new is launched. The definition is persisted
    /// before the job function runs; a storage failure aborts the start so
    /// the store never lags behind reality.
    pub async fn start(&self, id: &str, job_type: &str, params: JobParams) -> Result<JobStatus> {
        validate_id(id)?;

        if self.registry.resolve(job_type).is_none() {
            return Err(JobError::UnknownJobType(job_type.to_string()));
        }

        // The lock is held across the whole mutation so a concurrent start or
        // stop on the same id cannot interleave.
        let mut running = self.running.lock().await;
        if running.contains_key(id) {
            debug!(job_id = %id, "Job already running, start is a no-op");
            return Ok(JobStatus::Running);
        }

        let definition = JobDefinition {
            job_type: job_type.to_string(),
            params,
        };
        self.store.put(id, &definition).await?;

        if let Err(e) = self.launch(&mut running, id, &definition) {
            // The record was just written for a job that will never run;
            // roll it back so recovery does not resurrect it.
            if let Err(del) = self.store.delete(id).await {
                warn!(job_id = %id, error = %del, "Failed to roll back record for unlaunchable job");
            }
            return Err(e);
        }

        self.orphaned.write().await.remove(id);

        info!(job_id = %id, job_type = %job_type, "Job started");
        Ok(JobStatus::Running)
    }

    /// Stop a job and wait for its cleanup to complete.
    ///
    /// After this returns `Stopped`, any actuator the job controlled is in
    /// its safe state. Stopping an id with no running job returns
    /// `NotRunning` and leaves the store untouched.
    pub async fn stop(&self, id: &str) -> Result<StopOutcome> {
        let mut running = self.running.lock().await;
        let Some(job) = running.remove(id) else {
            debug!(job_id = %id, "Stop requested for job that is not running");
            return Ok(StopOutcome::NotRunning);
        };

        job.cancel.cancel();
        // Still holding the lock: a concurrent start on this id waits until
        // the old job has fully wound down.
        if let Err(e) = job.handle.await {
            warn!(job_id = %id, error = %e, "Job task failed while stopping");
        }
        drop(running);

        // The job is already physically stopped; a delete failure leaves a
        // stale record for the next recovery rather than rolling anything
        // back.
        if let Err(e) = self.store.delete(id).await {
            warn!(job_id = %id, error = %e, "Failed to delete job record after stop");
        }

        info!(job_id = %id, job_type = %job.job_type, "Job stopped");
        Ok(StopOutcome::Stopped)
    }

    /// Ids of currently running jobs, sorted.
    pub async fn list(&self) -> Vec<String> {
        let running = self.running.lock().await;
        let mut ids: Vec<String> = running.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    /// Ids of orphaned records found at recovery, sorted.
    pub async fn orphaned(&self) -> Vec<String> {
        self.orphaned.read().await.iter().cloned().collect()
    }

    /// Look up a job by id against the durable store.
    ///
    /// Available even when no process-level handle exists for the id.
    pub async fn info(&self, id: &str) -> Option<JobInfo> {
        let definition = self.store.get(id).await?;

        let status = if self.running.lock().await.contains_key(id) {
            JobStatus::Running
        } else if self.orphaned.read().await.contains(id) {
            JobStatus::Orphaned
        } else {
            JobStatus::Stopped
        };

        Some(JobInfo {
            id: id.to_string(),
            job_type: definition.job_type,
            status,
            params: definition.params,
        })
    }

    /// Relaunch every persisted job.
    ///
    /// Runs once at construction time, before the server accepts requests.
    /// Records are launched directly (no re-`put`). A record whose job type
    /// is no longer registered, or whose params no longer validate, is kept
    /// in the store and flagged as orphaned rather than deleted.
    pub async fn recover(&self) -> Result<RecoveryResult> {
        let load = self.store.load().await?;
        let mut result = RecoveryResult {
            errors: load.errors,
            ..Default::default()
        };

        let mut running = self.running.lock().await;
        for (id, definition) in self.store.list().await {
            if running.contains_key(&id) {
                continue;
            }
            match self.launch(&mut running, &id, &definition) {
                Ok(()) => {
                    debug!(job_id = %id, job_type = %definition.job_type, "Resumed job");
                    result.recovered += 1;
                }
                Err(e) => {
                    warn!(
                        job_id = %id,
                        job_type = %definition.job_type,
                        error = %e,
                        "Cannot resume persisted job, keeping its record"
                    );
                    self.orphaned.write().await.insert(id);
                    result.orphaned += 1;
                }
            }
        }
        drop(running);

        if result.recovered > 0 || result.orphaned > 0 || !result.errors.is_empty() {
            info!(
                recovered = result.recovered,
                orphaned = result.orphaned,
                errors = result.errors.len(),
                "Job recovery complete"
            );
        }

        Ok(result)
    }

    /// Cancel and drain every running job.
    ///
    /// Store records are left in place so the next startup resumes them.
    pub async fn shutdown(&self) {
        let drained: Vec<(String, RunningJob)> = {
            let mut running = self.running.lock().await;
            running.drain().collect()
        };

        let count = drained.len();
        for (id, job) in drained {
            job.cancel.cancel();
            if let Err(e) = job.handle.await {
                warn!(job_id = %id, error = %e, "Job task failed during shutdown");
            }
            debug!(job_id = %id, "Job drained");
        }

        if count > 0 {
            info!(jobs = count, "All jobs drained");
        }
    }

    /// Resolve, validate, spawn, and record one job under an already-held
    /// running-map lock.
    fn launch(
        &self,
        running: &mut HashMap<String, RunningJob>,
        id: &str,
        definition: &JobDefinition,
    ) -> Result<()> {
        let func = self
            .registry
            .resolve(&definition.job_type)
            .ok_or_else(|| JobError::UnknownJobType(definition.job_type.clone()))?;

        let cancel = CancellationToken::new();
        let future = func(&definition.params, cancel.clone())?;
        let handle = tokio::spawn(future);

        running.insert(
            id.to_string(),
            RunningJob {
                job_type: definition.job_type.clone(),
                cancel,
                handle,
            },
        );
        Ok(())
    }
}

/// Job ids become store file names, so restrict them to a safe alphabet.
fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(JobError::InvalidId("id must not be empty".to_string()));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(JobError::InvalidId(format!(
            "id '{id}' may only contain letters, digits, '-' and '_'"
        )));
    }
    Ok(())
}
