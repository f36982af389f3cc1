//! Job execution trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Job, JobOutcome};

/// Where a job runs and where its output goes.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Directory the process is started in.
    pub work_dir: PathBuf,
    /// File receiving the process's stdout and stderr.
    pub output_path: PathBuf,
    /// Worker thread running the job.
    pub worker_id: usize,
}

impl JobContext {
    /// Context for `job` inside `work_dir`; output goes to `<work_dir>/<id>.out`.
    #[must_use]
    pub fn for_job(job: &Job, work_dir: &Path, worker_id: usize) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            output_path: work_dir.join(job.output_file_name()),
            worker_id,
        }
    }
}

/// Runs one job to completion and classifies the result.
///
/// Called from a dedicated worker thread that drives its own single-threaded
/// tokio runtime, so implementations may await process exit freely. A job
/// that cannot be started must come back as a `JobOutcome::Failed` with
/// `JobFailure::Spawn`, never as a panic.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use jobrunner::core::{Job, JobContext, JobExecutor, JobOutcome};
///
/// #[derive(Clone)]
/// struct AlwaysOk;
///
/// #[async_trait]
/// impl JobExecutor for AlwaysOk {
///     async fn execute(&self, _job: &Job, _ctx: &JobContext) -> JobOutcome {
///         JobOutcome::Succeeded { elapsed: std::time::Duration::ZERO }
///     }
/// }
/// ```
#[async_trait]
pub trait JobExecutor: Send + Sync + Clone + 'static {
    /// Execute `job` and report how it ended.
    async fn execute(&self, job: &Job, ctx: &JobContext) -> JobOutcome;
}
