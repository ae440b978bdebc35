//! Queue configuration.

use serde::{Deserialize, Serialize};

use crate::QueueError;

/// Number of worker threads when nothing else is configured.
pub const DEFAULT_WORKER_COUNT: usize = 5;

/// Configuration for the job queue and its worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Number of worker threads executing jobs.
    pub worker_count: usize,
    /// Prefix for worker thread names.
    pub thread_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            thread_name: "jqueue".to_string(),
        }
    }
}

impl QueueConfig {
    /// Set the number of worker threads.
    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Build a config from environment variables.
    ///
    /// - `JQUEUE_WORKERS` (default: 5)
    /// - `JQUEUE_THREAD_NAME` (default: `jqueue`)
    pub fn from_env() -> Result<Self, QueueError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, QueueError> {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("JQUEUE_WORKERS").and_then(non_empty) {
            cfg.worker_count = raw.trim().parse().map_err(|_| {
                QueueError::InvalidConfig(format!(
                    "JQUEUE_WORKERS={raw} (expected a positive integer)"
                ))
            })?;
        }
        if let Some(name) = lookup("JQUEUE_THREAD_NAME").and_then(non_empty) {
            cfg.thread_name = name;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the worker pool cannot run with.
    pub fn validate(&self) -> Result<(), QueueError> {
        if self.worker_count == 0 {
            return Err(QueueError::InvalidConfig(
                "worker_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
