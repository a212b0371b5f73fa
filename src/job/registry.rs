//! Static registry mapping job-type names to job functions.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use super::definition::JobParams;
use super::error::{JobError, Result};

/// The running half of a job: a future that loops until cancelled.
pub type JobFuture = BoxFuture<'static, ()>;

/// A registered job function.
///
/// Validates the parameter map up front and returns the loop future, or
/// `InvalidParams`. The future observes the token at its suspension points
/// and performs its own cleanup before resolving.
pub type JobFn = Arc<dyn Fn(&JobParams, CancellationToken) -> Result<JobFuture> + Send + Sync>;

/// Name-keyed map of job functions, built once at process init and read-only
/// thereafter.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: HashMap<String, JobFn>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job function under a name.
    ///
    /// Registering the same name twice is a configuration error, caught here
    /// rather than at dispatch time.
    pub fn register(&mut self, name: impl Into<String>, func: JobFn) -> Result<()> {
        let name = name.into();
        if self.jobs.contains_key(&name) {
            return Err(JobError::DuplicateJobType(name));
        }
        self.jobs.insert(name, func);
        Ok(())
    }

    /// Resolve a job-type name to its function.
    pub fn resolve(&self, name: &str) -> Option<JobFn> {
        self.jobs.get(name).cloned()
    }

    /// Registered job-type names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    fn noop_job() -> JobFn {
        Arc::new(|_params, cancel| {
            Ok(async move {
                cancel.cancelled().await;
            }
            .boxed())
        })
    }

    #[test]
    fn resolve_registered_job() {
        let mut registry = JobRegistry::new();
        registry.register("cycle", noop_job()).unwrap();

        assert!(registry.resolve("cycle").is_some());
        assert!(registry.resolve("unknown").is_none());
    }

    #[test]
    fn duplicate_registration_is_an_error() {
        let mut registry = JobRegistry::new();
        registry.register("cycle", noop_job()).unwrap();

        let err = registry.register("cycle", noop_job()).unwrap_err();
        assert!(matches!(err, JobError::DuplicateJobType(name) if name == "cycle"));
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = JobRegistry::new();
        registry.register("poll", noop_job()).unwrap();
        registry.register("cycle", noop_job()).unwrap();

        assert_eq!(registry.names(), vec!["cycle", "poll"]);
    }
}
