//! Fixed-size pool of OS worker threads fed from a FIFO channel.

use std::fmt::Display;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use jqueue_core::QueueError;
use parking_lot::Mutex;

/// A pool of worker threads running tasks through one injected closure.
///
/// Each task is received by exactly one worker. A task that returns an error
/// or panics is logged and dropped; the worker moves on to the next task.
pub struct WorkerPool<T: Send + 'static> {
    name: String,
    sender: Mutex<Option<Sender<T>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Start `size` workers, each calling `run(worker_id, task)` per task.
    pub fn new<F, E>(name: impl Into<String>, size: usize, run: F) -> Result<Self, QueueError>
    where
        F: Fn(usize, T) -> Result<(), E> + Send + Sync + 'static,
        E: Display,
    {
        let name = name.into();
        let (sender, receiver) = crossbeam_channel::unbounded::<T>();
        let run = Arc::new(run);

        let pool = Self {
            name,
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(Vec::with_capacity(size)),
        };

        for worker_id in 1..=size {
            let receiver = receiver.clone();
            let run = run.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("{}-worker-{}", pool.name, worker_id))
                .spawn(move || worker_loop(worker_id, receiver, run.as_ref()));

            match spawned {
                Ok(handle) => pool.workers.lock().push(handle),
                Err(e) => {
                    pool.shutdown();
                    return Err(QueueError::Spawn(e));
                }
            }
        }

        tracing::info!("Started worker pool {} with {} workers", pool.name, size);
        Ok(pool)
    }

    /// Queue a task for the next idle worker.
    pub fn add_task(&self, task: T) -> Result<(), QueueError> {
        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) => tx.send(task).map_err(|_| QueueError::ShutDown),
            None => Err(QueueError::ShutDown),
        }
    }

    /// Check if the pool still takes new tasks.
    pub fn is_accepting(&self) -> bool {
        self.sender.lock().is_some()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Stop taking tasks and wait for the workers to exit.
    ///
    /// Tasks already queued are still run before the workers exit. Every
    /// caller blocks until the workers are joined, including callers that
    /// arrive while another shutdown is in progress.
    pub fn shutdown(&self) {
        let closing = self.sender.lock().take().is_some();
        if closing {
            tracing::info!("Shutting down worker pool {}", self.name);
        }

        // Held across the joins so concurrent callers wait for them too.
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let thread_name = handle.thread().name().map(str::to_string);
            if handle.join().is_err() {
                tracing::error!("Worker thread {:?} exited abnormally", thread_name);
            }
        }

        if closing {
            tracing::info!("Worker pool {} stopped", self.name);
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<T: Send + 'static> std::fmt::Debug for WorkerPool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("workers", &self.worker_count())
            .field("accepting", &self.is_accepting())
            .finish()
    }
}

fn worker_loop<T, F, E>(worker_id: usize, receiver: Receiver<T>, run: &F)
where
    F: Fn(usize, T) -> Result<(), E>,
    E: Display,
{
    tracing::debug!("Worker {} started", worker_id);

    // recv fails once the pool dropped its sender and the channel is empty.
    while let Ok(task) = receiver.recv() {
        match catch_unwind(AssertUnwindSafe(|| run(worker_id, task))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Worker {} task failed: {}", worker_id, e),
            Err(_) => tracing::error!("Worker {} task panicked, continuing", worker_id),
        }
    }

    tracing::debug!("Worker {} exiting", worker_id);
}
