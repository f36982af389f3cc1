//! Core scheduling abstractions: jobs, parsing, the worker pool and the
//! scheduler that drives it.

pub mod capacity;
pub mod error;
pub mod executor;
pub mod job;
pub mod logger;
pub mod progress;
pub mod scheduler;
pub mod source;
pub mod worker_pool;

pub use capacity::detect_capacity;
pub use error::{AppResult, JobFailure, RunnerError};
pub use executor::{JobContext, JobExecutor};
pub use job::{Job, JobOutcome, JobReport, JobStatus};
pub use logger::{FileLogSink, InMemoryLogSink, LogEntry, LogLevel, LogSink, NullLogSink, RunLogger};
pub use progress::ProgressReporter;
pub use scheduler::{RunCounters, RunSummary, Scheduler};
pub use source::{parse_line, parse_lines, read_jobs};
pub use worker_pool::{PoolError, PoolStats, StopHandle, WorkerEvent, WorkerPool};
