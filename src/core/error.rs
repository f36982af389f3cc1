//! Error types for runner operations.

use thiserror::Error;

use crate::core::worker_pool::PoolError;

/// Run-level errors. Any of these aborts the run before (or instead of)
/// starting jobs.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// An input line could not be split into `<id> <command>`.
    #[error("malformed job line {line_number}: {line:?} (expected `<id> <command>`)")]
    MalformedJobLine {
        /// 1-based line number in the input.
        line_number: usize,
        /// The offending line, without its terminator.
        line: String,
    },
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The worker pool refused the run.
    #[error("worker pool error: {0}")]
    Pool(#[from] PoolError),
    /// Filesystem or stream failure during setup.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single job ended in the FAILED state. Never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobFailure {
    /// The process could not be started at all.
    #[error("could not be started: {0}")]
    Spawn(String),
    /// The process exited with a non-zero status.
    #[error("finished with ERROR CODE {0}")]
    ExitCode(i32),
    /// The process was killed by a signal (Unix only).
    #[error("was terminated by signal {0}")]
    Signal(i32),
    /// The worker running the job went away before reporting an outcome.
    #[error("was lost: worker exited before reporting an outcome")]
    Lost,
}

impl JobFailure {
    /// Exit code to report for this failure, if the process produced one.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitCode(code) => Some(*code),
            _ => None,
        }
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
