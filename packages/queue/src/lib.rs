//! Thread-based runtime for the job queue.
//!
//! # Architecture
//!
//! - `JobQueue` - Allocates job ids, owns the job table, answers queries
//! - `WorkerPool` - Fixed set of OS threads executing jobs from a FIFO channel
//! - `QueuedJob` - A job's opcode slots behind their own lock
//! - `Processor` - Executes one opcode; `OpcodeRegistry` dispatches by `OP_ID`
//!
//! # Usage
//!
//! ```ignore
//! use jqueue::{JobQueue, OpcodeRegistry, QueueConfig};
//!
//! let registry = OpcodeRegistry::new();
//! let queue = JobQueue::start(&QueueConfig::default(), move || registry.clone())?;
//! let id = queue.submit(vec![serde_json::json!({"OP_ID": "OP_TEST_ECHO"})])?;
//! let rows = queue.query(Some(&[id]), &["status", "result"])?;
//! queue.shutdown();
//! ```

mod handler;
mod job;
mod job_queue;
mod processor;
mod worker_pool;

pub use handler::{FnHandler, HandlerResult, OP_ID_KEY, OpcodeHandler, OpcodeRegistry};
pub use job::{JobError, QueuedJob};
pub use job_queue::JobQueue;
pub use processor::{Feedback, NoFeedback, Processor, ProcessorError, ProcessorFactory};
pub use worker_pool::WorkerPool;

/// Re-export core types for convenience.
pub use jqueue_core::{
    FieldValue, JobId, JobRow, JobStatus, OpStatus, OpcodeResult, OpcodeSlot, QueryField,
    QueueConfig, QueueError, QueueResult,
};
