//! Core domain types for the job queue.
//!
//! This crate contains the plain data shared by the runtime and its callers:
//! - JobId, OpcodeSlot and the status values with their aggregation rule
//! - Query fields and projected values
//! - QueueConfig and the error type
//! - The QMP vCPU descriptor mapping

mod error;
mod job;
mod query;
mod queue;
pub mod vcpu;

pub use error::{QueueError, QueueResult};
pub use job::{JobId, JobStatus, OpStatus, OpcodeResult, OpcodeSlot};
pub use query::{FieldValue, JobRow, QueryField};
pub use queue::{DEFAULT_WORKER_COUNT, QueueConfig};
pub use vcpu::{QmpVcpu, VcpuError};
