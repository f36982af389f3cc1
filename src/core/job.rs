//! Job records and per-job lifecycle types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::JobFailure;

/// One unit of work: an identifier paired with a shell command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Identifier, also used to name the job's output file.
    pub id: String,
    /// Command line handed verbatim to the shell.
    pub command: String,
}

impl Job {
    /// Create a job from an id and a command.
    #[must_use]
    pub fn new(id: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            command: command.into(),
        }
    }

    /// File name of this job's captured output, `<id>.out`.
    #[must_use]
    pub fn output_file_name(&self) -> String {
        format!("{}.out", self.id)
    }
}

/// Status of a job in the run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting for a free slot.
    Pending,
    /// Process launched and not yet reaped.
    Running,
    /// Exited with status zero.
    Succeeded,
    /// Could not start, exited non-zero, or was killed.
    Failed,
    /// Never started because the run was interrupted.
    Skipped,
}

impl JobStatus {
    /// Whether this status is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }
}

/// Result of running one job to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Exit status zero.
    Succeeded {
        /// Wall-clock time from launch to exit.
        elapsed: Duration,
    },
    /// Any other end.
    Failed {
        /// Classification of the failure.
        failure: JobFailure,
        /// Wall-clock time from launch attempt to the failure.
        elapsed: Duration,
    },
}

impl JobOutcome {
    /// Terminal status matching this outcome.
    #[must_use]
    pub const fn status(&self) -> JobStatus {
        match self {
            Self::Succeeded { .. } => JobStatus::Succeeded,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }

    /// Wall-clock time the job took.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Succeeded { elapsed } | Self::Failed { elapsed, .. } => *elapsed,
        }
    }
}

/// Final record of one job, listed in completion order in a run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    /// Job identifier.
    pub id: String,
    /// 1-based admission position; `None` for skipped jobs.
    pub admitted_index: Option<usize>,
    /// Terminal status.
    pub status: JobStatus,
    /// Exit code for non-zero exits.
    pub exit_code: Option<i32>,
    /// Wall-clock milliseconds, zero for skipped jobs.
    pub elapsed_ms: u64,
    /// Failure description for failed jobs.
    pub error: Option<String>,
}
