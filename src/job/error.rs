//! Job subsystem error types.

use thiserror::Error;

/// Errors that can occur in the job subsystem.
#[derive(Debug, Error)]
pub enum JobError {
    /// Start referenced a job type that is not registered.
    #[error("unknown job type: {0}")]
    UnknownJobType(String),

    /// Two job functions were registered under the same name.
    #[error("job type already registered: {0}")]
    DuplicateJobType(String),

    /// Job id is empty or contains characters unsafe for a store key.
    #[error("invalid job id: {0}")]
    InvalidId(String),

    /// The job function rejected the parameter map.
    #[error("invalid job parameters: {0}")]
    InvalidParams(String),

    /// Durable store I/O failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for job operations.
pub type Result<T> = std::result::Result<T, JobError>;
