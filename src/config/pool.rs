//! Worker pool configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default stack size for worker threads.
pub const DEFAULT_THREAD_STACK_SIZE: usize = 2 * 1024 * 1024;

/// Configuration for a `WorkerPool`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerPoolConfig {
    /// Number of worker threads, i.e. the concurrency cap.
    pub worker_count: usize,
    /// Maximum jobs waiting in the queue before `submit` is refused.
    pub max_queue_depth: usize,
    /// Directory jobs run in and write their output files to.
    pub work_dir: PathBuf,
    /// Stack size for each worker thread.
    pub thread_stack_size: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            max_queue_depth: 1024,
            work_dir: PathBuf::from("."),
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
        }
    }
}

impl WorkerPoolConfig {
    /// Defaults: one worker, queue depth 1024, current directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads.
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the queue depth.
    #[must_use]
    pub const fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Validate pool configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.worker_count == 0 {
            return Err("worker_count must be greater than 0".into());
        }
        if self.max_queue_depth == 0 {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }
}
