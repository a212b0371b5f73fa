//! Durable named jobs.
//!
//! A job is a long-running, cancellable loop identified by a caller-chosen
//! id and a registered job-type name. Definitions persist in the
//! [`JobStore`]; the [`Scheduler`] enforces at-most-one-running-job-per-id
//! and rebuilds the running set from the store on startup.

pub mod cycle;
pub mod definition;
pub mod error;
pub mod poll;
pub mod registry;
pub mod scheduler;
pub mod store;

pub use definition::{JobDefinition, JobParams, ParamValue};
pub use error::{JobError, Result};
pub use registry::{JobFn, JobFuture, JobRegistry};
pub use scheduler::{JobInfo, JobStatus, RecoveryResult, Scheduler, StopOutcome};
pub use store::{JobStore, LoadResult};
