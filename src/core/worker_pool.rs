//! Worker pool with one dedicated OS thread per concurrency slot.
//!
//! Workers pull jobs from a shared FIFO channel, block on their own
//! subprocess, and report `Started`/`Finished` events back over a second
//! channel to a single coordinator. With `worker_count` workers, at most
//! `worker_count` jobs are ever in flight.
//!
//! # Example
//!
//! ```rust,ignore
//! use jobrunner::config::WorkerPoolConfig;
//! use jobrunner::core::{Job, StopHandle, WorkerPool};
//!
//! let (events_tx, events_rx) = crossbeam_channel::unbounded();
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new().with_worker_count(4).with_max_queue_depth(100),
//!     my_executor,
//!     events_tx,
//!     StopHandle::new(),
//! )?;
//! pool.submit(0, Job::new("a", "echo hi"))?;
//! pool.close();
//! for event in events_rx { /* ... */ }
//! pool.join();
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::{Job, JobOutcome};

pub use native::WorkerPool;

/// Errors that can occur when using a `WorkerPool`.
#[derive(Debug)]
pub enum PoolError {
    /// The job queue is full; no more jobs can be accepted.
    QueueFull,

    /// The pool has been closed or shut down.
    PoolShutdown,

    /// Configuration validation failed.
    InvalidConfig(String),

    /// Internal error (worker thread could not be spawned, etc.).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "job queue is full"),
            Self::PoolShutdown => write!(f, "pool has been shut down"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {}

/// Notification from a worker to the coordinator. Events for one job always
/// arrive in order (`Started` before `Finished`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// A worker dequeued the job and is launching it.
    Started {
        /// Submission sequence number.
        seq: usize,
        /// Worker running the job.
        worker_id: usize,
    },
    /// The job reached a terminal outcome.
    Finished {
        /// Submission sequence number.
        seq: usize,
        /// How it ended.
        outcome: JobOutcome,
    },
    /// The job was dequeued after a stop request and never started.
    Skipped {
        /// Submission sequence number.
        seq: usize,
    },
}

/// Shared flag that stops admission of further jobs. Jobs already started are
/// left to run to completion.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// A handle with no stop requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask workers to stop starting new jobs.
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Currently executing jobs.
    pub active_tasks: u64,

    /// Jobs waiting in the queue.
    pub queued_tasks: u64,

    /// Jobs that exited with status zero.
    pub completed_tasks: u64,

    /// Jobs that failed in any way.
    pub failed_tasks: u64,

    /// Jobs dropped after a stop request.
    pub skipped_tasks: u64,

    /// Total jobs submitted.
    pub submitted_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub queued_tasks: AtomicU64,
    pub completed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
    pub skipped_tasks: AtomicU64,
    pub submitted_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            queued_tasks: self.queued_tasks.load(Ordering::Relaxed),
            completed_tasks: self.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
            skipped_tasks: self.skipped_tasks.load(Ordering::Relaxed),
            submitted_tasks: self.submitted_tasks.load(Ordering::Relaxed),
        }
    }
}

/// A job queued for a worker.
#[derive(Debug)]
pub(crate) struct WorkerTask {
    /// Submission sequence number.
    pub seq: usize,
    /// The job to run.
    pub job: Job,
}
