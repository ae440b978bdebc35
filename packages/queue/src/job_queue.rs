//! The job queue: id allocation, the job table, queries and shutdown.

use std::collections::HashMap;
use std::sync::Arc;

use jqueue_core::{JobId, JobRow, QueryField, QueueConfig, QueueError, QueueResult};
use parking_lot::Mutex;

use crate::job::QueuedJob;
use crate::processor::{Feedback, NoFeedback, ProcessorFactory};
use crate::worker_pool::WorkerPool;

/// Registry state: guarded by its own lock, never held while a job runs
/// or while any job's lock is held.
#[derive(Debug)]
struct Registry {
    last_job_id: JobId,
    jobs: HashMap<JobId, Arc<QueuedJob>>,
}

impl Registry {
    fn new() -> Self {
        Self {
            last_job_id: JobId(0),
            jobs: HashMap::new(),
        }
    }

    fn next_job_id(&mut self) -> JobId {
        self.last_job_id = self.last_job_id.next();
        self.last_job_id
    }
}

/// In-process job queue.
///
/// Jobs are kept for the lifetime of the queue; there is no archival.
pub struct JobQueue {
    registry: Mutex<Registry>,
    pool: WorkerPool<Arc<QueuedJob>>,
}

impl JobQueue {
    /// Start a queue whose workers build processors from `processors`.
    pub fn start<P: ProcessorFactory>(config: &QueueConfig, processors: P) -> QueueResult<Self> {
        Self::start_with_feedback(config, processors, NoFeedback)
    }

    /// Start a queue that forwards opcode progress messages to `feedback`.
    pub fn start_with_feedback<P, F>(
        config: &QueueConfig,
        processors: P,
        feedback: F,
    ) -> QueueResult<Self>
    where
        P: ProcessorFactory,
        F: Feedback + 'static,
    {
        config.validate()?;

        let pool = WorkerPool::new(
            config.thread_name.clone(),
            config.worker_count,
            move |worker_id, job: Arc<QueuedJob>| {
                tracing::debug!("Worker {} processing job {}", worker_id, job.id());
                let mut processor = processors.new_processor();
                let outcome = job.run(processor.as_mut(), &feedback);
                tracing::debug!(
                    "Worker {} finished job {}, status = {}",
                    worker_id,
                    job.id(),
                    job.status()
                );
                outcome
            },
        )?;

        Ok(Self {
            registry: Mutex::new(Registry::new()),
            pool,
        })
    }

    /// Add a new job and hand it to the workers.
    ///
    /// Returns as soon as the job is stored; execution is asynchronous.
    pub fn submit(&self, ops: Vec<serde_json::Value>) -> QueueResult<JobId> {
        if ops.is_empty() {
            return Err(QueueError::EmptyJob);
        }
        if !self.pool.is_accepting() {
            return Err(QueueError::ShutDown);
        }

        let job_id = self.registry.lock().next_job_id();
        let job = Arc::new(QueuedJob::new(job_id, ops)?);

        self.registry.lock().jobs.insert(job_id, job.clone());

        if let Err(e) = self.pool.add_task(job) {
            self.registry.lock().jobs.remove(&job_id);
            return Err(e);
        }

        tracing::debug!("Submitted job {}", job_id);
        Ok(job_id)
    }

    /// Look up a job by id.
    pub fn job(&self, job_id: JobId) -> Option<Arc<QueuedJob>> {
        self.registry.lock().jobs.get(&job_id).cloned()
    }

    /// Project `fields` for each job in `job_ids`.
    ///
    /// `None` or an empty slice means every known job, by ascending id.
    /// Otherwise rows follow the given order, with `None` for unknown ids.
    /// An unknown field name fails the whole query.
    pub fn query<S: AsRef<str>>(
        &self,
        job_ids: Option<&[JobId]>,
        fields: &[S],
    ) -> QueueResult<Vec<Option<JobRow>>> {
        let fields = QueryField::parse_all(fields)?;

        let jobs: Vec<Option<Arc<QueuedJob>>> = {
            let registry = self.registry.lock();
            match job_ids {
                Some(ids) if !ids.is_empty() => {
                    ids.iter().map(|id| registry.jobs.get(id).cloned()).collect()
                }
                _ => {
                    let mut all: Vec<_> = registry.jobs.values().cloned().collect();
                    all.sort_by_key(|job| job.id());
                    all.into_iter().map(Some).collect()
                }
            }
        };

        Ok(jobs
            .into_iter()
            .map(|job| job.map(|job| job.project(&fields)))
            .collect())
    }

    pub fn archive_job(&self, job_id: JobId) -> QueueResult<()> {
        Err(QueueError::Unsupported {
            operation: "archiving",
            job_id,
        })
    }

    pub fn cancel_job(&self, job_id: JobId) -> QueueResult<()> {
        Err(QueueError::Unsupported {
            operation: "cancelling",
            job_id,
        })
    }

    /// Number of jobs ever submitted.
    pub fn len(&self) -> usize {
        self.registry.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the queue.
    ///
    /// Blocks until every job already handed to the workers has finished.
    /// Later submissions fail with [`QueueError::ShutDown`].
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("jobs", &self.len())
            .field("pool", &self.pool)
            .finish()
    }
}
