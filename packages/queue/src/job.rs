//! In-memory job: the opcode slots, their lock, and sequential execution.

use std::panic::{AssertUnwindSafe, catch_unwind};

use chrono::{DateTime, Utc};
use jqueue_core::{
    FieldValue, JobId, JobRow, JobStatus, OpStatus, OpcodeResult, OpcodeSlot, QueryField,
    QueueError,
};
use parking_lot::Mutex;
use thiserror::Error;

use crate::processor::{Feedback, Processor, ProcessorError};

/// Why a job stopped before running all its opcodes.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("opcode {index} of job {job_id} failed: {source}")]
    OpcodeFailed {
        job_id: JobId,
        index: usize,
        #[source]
        source: ProcessorError,
    },
}

/// A submitted job.
///
/// The slot list is fixed at construction; the lock only guards slot
/// status, results and timestamps. It is never held while a processor runs.
#[derive(Debug)]
pub struct QueuedJob {
    id: JobId,
    received_ts: DateTime<Utc>,
    slots: Mutex<Vec<OpcodeSlot>>,
}

impl QueuedJob {
    /// Create a job from its opcodes. An empty opcode list is rejected.
    pub fn new(id: JobId, ops: Vec<serde_json::Value>) -> Result<Self, QueueError> {
        if ops.is_empty() {
            return Err(QueueError::EmptyJob);
        }

        Ok(Self {
            id,
            received_ts: Utc::now(),
            slots: Mutex::new(ops.into_iter().map(OpcodeSlot::new).collect()),
        })
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn received_ts(&self) -> DateTime<Utc> {
        self.received_ts
    }

    pub fn op_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Current aggregate status, derived from the slots.
    pub fn status(&self) -> JobStatus {
        let slots = self.slots.lock();
        JobStatus::aggregate(slots.iter().map(|slot| slot.status))
    }

    /// Copy of the slots as they are right now.
    pub fn snapshot(&self) -> Vec<OpcodeSlot> {
        self.slots.lock().clone()
    }

    /// Project the requested fields from one consistent view of the slots.
    pub fn project(&self, fields: &[QueryField]) -> JobRow {
        let slots = self.slots.lock();

        fields
            .iter()
            .map(|field| match field {
                QueryField::Id => FieldValue::Id(self.id),
                QueryField::Status => {
                    FieldValue::Status(JobStatus::aggregate(slots.iter().map(|s| s.status)))
                }
                QueryField::Result => {
                    FieldValue::Results(slots.iter().map(|s| s.result.clone()).collect())
                }
                QueryField::Ops => FieldValue::Ops(slots.iter().map(|s| s.input.clone()).collect()),
                QueryField::OpStatus => {
                    FieldValue::OpStatuses(slots.iter().map(|s| s.status).collect())
                }
                QueryField::ReceivedTs => FieldValue::Timestamp(Some(self.received_ts)),
                QueryField::StartTs => FieldValue::Timestamp(slots.first().and_then(|s| s.start_ts)),
                QueryField::EndTs => {
                    let status = JobStatus::aggregate(slots.iter().map(|s| s.status));
                    let end = if status.is_terminal() {
                        slots.iter().filter_map(|s| s.end_ts).max()
                    } else {
                        None
                    };
                    FieldValue::Timestamp(end)
                }
            })
            .collect()
    }

    /// Execute the opcodes in order with the given processor.
    ///
    /// Stops at the first failing opcode: it is marked `Error` with the
    /// failure text, every later opcode stays `Queued`, and the failure is
    /// returned. A panicking processor counts as a failure of that opcode.
    pub fn run(&self, processor: &mut dyn Processor, feedback: &dyn Feedback) -> Result<(), JobError> {
        let count = self.op_count();

        for index in 0..count {
            let input = {
                let mut slots = self.slots.lock();
                let slot = &mut slots[index];
                tracing::debug!("Job {} op {}/{}: starting", self.id, index + 1, count);
                slot.mark_running(Utc::now());
                slot.input.clone()
            };

            let outcome = catch_unwind(AssertUnwindSafe(|| processor.execute(&input, feedback)))
                .unwrap_or_else(|panic| Err(ProcessorError::new(panic_message(panic.as_ref()))));

            let mut slots = self.slots.lock();
            match outcome {
                Ok(output) => {
                    tracing::debug!("Job {} op {}/{}: success", self.id, index + 1, count);
                    slots[index].mark_success(output, Utc::now());
                }
                Err(source) => {
                    tracing::debug!(
                        "Job {} op {}/{}: error: {}",
                        self.id,
                        index + 1,
                        count,
                        source
                    );
                    slots[index].mark_error(source.message(), Utc::now());
                    return Err(JobError::OpcodeFailed {
                        job_id: self.id,
                        index,
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    /// Results of the resolved opcodes, `None` for the rest.
    pub fn results(&self) -> Vec<Option<OpcodeResult>> {
        self.slots.lock().iter().map(|s| s.result.clone()).collect()
    }

    /// Per-opcode statuses.
    pub fn op_statuses(&self) -> Vec<OpStatus> {
        self.slots.lock().iter().map(|s| s.status).collect()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("opcode panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("opcode panicked: {s}")
    } else {
        "opcode panicked".to_string()
    }
}
