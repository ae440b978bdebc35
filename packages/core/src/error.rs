//! Errors surfaced synchronously by the job queue.

use thiserror::Error;

use crate::JobId;

/// Errors returned by queue submission, query and lifecycle calls.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job has no opcodes")]
    EmptyJob,

    #[error("invalid job query field '{0}'")]
    UnknownField(String),

    #[error("{operation} is not supported (job {job_id})")]
    Unsupported {
        operation: &'static str,
        job_id: JobId,
    },

    #[error("job queue is shut down")]
    ShutDown,

    #[error("invalid queue config: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type QueueResult<T> = Result<T, QueueError>;
