//! The process scheduler: admits jobs into a fixed concurrency window,
//! consumes worker events, classifies outcomes and decides when the run is
//! done.
//!
//! The scheduler runs on the caller's thread and is the only writer of the
//! run state (counters, active set, per-job status). Workers never touch it;
//! they report over a channel.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::capacity::detect_capacity;
use crate::core::executor::JobExecutor;
use crate::core::logger::RunLogger;
use crate::core::progress::ProgressReporter;
use crate::core::worker_pool::{StopHandle, WorkerEvent, WorkerPool};
use crate::core::{Job, JobFailure, JobOutcome, JobReport, JobStatus, RunnerError};
use crate::util::clock::as_millis_u64;

/// Run-level counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    /// Jobs in the run; fixed once the run begins.
    pub total: usize,
    /// Jobs admitted so far.
    pub started: usize,
    /// Jobs that exited with status zero.
    pub succeeded: usize,
    /// Jobs that could not start, exited non-zero, or were lost.
    pub failed: usize,
    /// Jobs never started because the run was interrupted.
    pub skipped: usize,
}

impl RunCounters {
    /// Counters for a run of `total` jobs.
    #[must_use]
    pub const fn new(total: usize) -> Self {
        Self {
            total,
            started: 0,
            succeeded: 0,
            failed: 0,
            skipped: 0,
        }
    }

    /// Jobs in a terminal state.
    #[must_use]
    pub const fn finished(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Fraction of jobs started, driving the progress bar.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn started_fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.started as f64 / self.total as f64
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run label.
    pub label: String,
    /// Concurrency cap used.
    pub concurrency: usize,
    /// Final counters.
    pub counters: RunCounters,
    /// Largest number of jobs observed running at once.
    pub peak_active: usize,
    /// Whether a stop was requested during the run.
    pub interrupted: bool,
    /// One report per job, in completion order.
    pub jobs: Vec<JobReport>,
}

impl RunSummary {
    /// True when every job ran and succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.counters.failed == 0 && self.counters.skipped == 0
    }
}

/// A running job in the active set.
#[derive(Debug)]
struct ActiveJob {
    admitted_index: usize,
    worker_id: usize,
    started_at: Instant,
}

/// Mutable state of one run, owned by the coordinating thread.
struct RunState<'a> {
    jobs: &'a [Job],
    counters: RunCounters,
    statuses: Vec<JobStatus>,
    /// Keyed by submission sequence, so duplicate ids never collide.
    active: BTreeMap<usize, ActiveJob>,
    peak_active: usize,
    reports: Vec<JobReport>,
    saw_skip: bool,
}

impl<'a> RunState<'a> {
    fn new(jobs: &'a [Job]) -> Self {
        Self {
            jobs,
            counters: RunCounters::new(jobs.len()),
            statuses: vec![JobStatus::Pending; jobs.len()],
            active: BTreeMap::new(),
            peak_active: 0,
            reports: Vec::with_capacity(jobs.len()),
            saw_skip: false,
        }
    }

    fn admit(
        &mut self,
        seq: usize,
        worker_id: usize,
        logger: &mut RunLogger,
        progress: &mut ProgressReporter,
    ) {
        let job = &self.jobs[seq];
        self.counters.started += 1;
        self.statuses[seq] = JobStatus::Running;
        self.active.insert(
            seq,
            ActiveJob {
                admitted_index: self.counters.started,
                worker_id,
                started_at: Instant::now(),
            },
        );
        self.peak_active = self.peak_active.max(self.active.len());

        logger.info(format!("Executing job {}: {}", job.id, job.command.trim()));
        progress.update(
            self.counters.started_fraction(),
            &format!(
                "Starting command {} of {}",
                self.counters.started, self.counters.total
            ),
        );
    }

    fn finish(&mut self, seq: usize, outcome: &JobOutcome, logger: &mut RunLogger) {
        let job = &self.jobs[seq];
        let Some(active) = self.active.remove(&seq) else {
            warn!(seq, job_id = %job.id, "Finished event for a job that was not running");
            return;
        };
        debug!(
            job_id = %job.id,
            worker_id = active.worker_id,
            wall_ms = as_millis_u64(active.started_at.elapsed()),
            "Job left the active set"
        );

        let (exit_code, error) = match outcome {
            JobOutcome::Succeeded { .. } => {
                self.counters.succeeded += 1;
                logger.info(format!("Job {} has finished", job.id));
                (None, None)
            }
            JobOutcome::Failed { failure, .. } => {
                self.counters.failed += 1;
                logger.error(format!("Job {} {failure}", job.id));
                (failure.exit_code(), Some(failure.to_string()))
            }
        };
        self.statuses[seq] = outcome.status();
        self.reports.push(JobReport {
            id: job.id.clone(),
            admitted_index: Some(active.admitted_index),
            status: outcome.status(),
            exit_code,
            elapsed_ms: as_millis_u64(outcome.elapsed()),
            error,
        });
    }

    fn skip(&mut self, seq: usize, logger: &mut RunLogger) {
        let job = &self.jobs[seq];
        if !self.saw_skip {
            self.saw_skip = true;
            logger.warning("Stop requested: no further jobs will be started");
        }
        self.counters.skipped += 1;
        self.statuses[seq] = JobStatus::Skipped;
        logger.warning(format!("Job {} skipped: run interrupted", job.id));
        self.reports.push(JobReport {
            id: job.id.clone(),
            admitted_index: None,
            status: JobStatus::Skipped,
            exit_code: None,
            elapsed_ms: 0,
            error: None,
        });
    }

    /// Classify jobs that never reported a terminal outcome (their worker
    /// died) as lost.
    fn reap_lost(&mut self, logger: &mut RunLogger) {
        for seq in 0..self.jobs.len() {
            if self.statuses[seq].is_terminal() {
                continue;
            }
            let (admitted_index, elapsed) = self.active.remove(&seq).map_or((None, 0), |a| {
                (Some(a.admitted_index), as_millis_u64(a.started_at.elapsed()))
            });
            let failure = JobFailure::Lost;
            let job = &self.jobs[seq];
            logger.error(format!("Job {} {failure}", job.id));
            self.counters.failed += 1;
            self.statuses[seq] = JobStatus::Failed;
            self.reports.push(JobReport {
                id: job.id.clone(),
                admitted_index,
                status: JobStatus::Failed,
                exit_code: None,
                elapsed_ms: elapsed,
                error: Some(failure.to_string()),
            });
        }
    }
}

/// Bounded-concurrency job scheduler.
pub struct Scheduler<E>
where
    E: JobExecutor,
{
    concurrency: usize,
    available_cpus: usize,
    work_dir: PathBuf,
    executor: E,
    logger: RunLogger,
    progress: ProgressReporter,
    stop: StopHandle,
}

impl<E> Scheduler<E>
where
    E: JobExecutor,
{
    /// Create a scheduler with a concurrency cap. The cap is not compared
    /// with the host's core count.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::InvalidConfig` when `concurrency` is zero.
    pub fn new(
        concurrency: usize,
        work_dir: impl Into<PathBuf>,
        executor: E,
        logger: RunLogger,
    ) -> Result<Self, RunnerError> {
        if concurrency == 0 {
            return Err(RunnerError::InvalidConfig(
                "concurrency must be greater than 0".into(),
            ));
        }
        Ok(Self {
            concurrency,
            available_cpus: detect_capacity(),
            work_dir: work_dir.into(),
            executor,
            logger,
            progress: ProgressReporter::disabled(),
            stop: StopHandle::new(),
        })
    }

    /// Attach a progress reporter.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Use an externally owned stop handle (e.g. wired to Ctrl-C).
    #[must_use]
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Handle that stops admission of further jobs.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Concurrency cap.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every job to a terminal state and return the summary.
    ///
    /// Jobs are admitted in order, at most `concurrency` at a time. A job
    /// that fails, or cannot be started, never affects the others.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError::Pool` if the worker pool cannot be built.
    /// Per-job failures are reported in the summary, not as errors.
    pub fn run(mut self, jobs: Vec<Job>) -> Result<RunSummary, RunnerError> {
        let total = jobs.len();
        self.logger.info(format!(
            "Available CPUs = {} / using {} CPUs",
            self.available_cpus, self.concurrency
        ));
        self.logger.info(format!("Number of jobs = {total}"));

        let mut state = RunState::new(&jobs);
        if total == 0 {
            self.progress.finish("All 0 tasks completed");
            return Ok(self.summarize(state));
        }
        self.warn_duplicate_ids(&jobs);

        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let pool_config = WorkerPoolConfig::new()
            .with_worker_count(self.concurrency.min(total))
            .with_max_queue_depth(total)
            .with_work_dir(self.work_dir.clone());
        let pool = WorkerPool::new(pool_config, self.executor.clone(), events_tx, self.stop.clone())?;

        for (seq, job) in jobs.iter().enumerate() {
            if let Err(e) = pool.submit(seq, job.clone()) {
                self.stop.request_stop();
                pool.join();
                return Err(e.into());
            }
        }
        pool.close();
        info!(total, concurrency = self.concurrency, "All jobs queued");

        // Ends once every worker has drained the queue and exited.
        for event in &events_rx {
            match event {
                WorkerEvent::Started { seq, worker_id } => {
                    state.admit(seq, worker_id, &mut self.logger, &mut self.progress);
                }
                WorkerEvent::Finished { seq, outcome } => {
                    state.finish(seq, &outcome, &mut self.logger);
                }
                WorkerEvent::Skipped { seq } => state.skip(seq, &mut self.logger),
            }
        }

        let panicked = pool.join();
        if panicked > 0 {
            warn!(panicked, "Workers panicked during the run");
        }
        state.reap_lost(&mut self.logger);
        debug!(stats = ?pool.stats(), "Final pool statistics");

        let counters = state.counters;
        if counters.skipped > 0 {
            self.progress.finish(&format!(
                "Interrupted: {} of {total} tasks started, {} skipped",
                counters.started, counters.skipped
            ));
        } else {
            self.progress.finish(&format!("All {total} tasks completed"));
        }
        self.logger.info(format!(
            "All {total} jobs completed: {} succeeded, {} failed, {} skipped",
            counters.succeeded, counters.failed, counters.skipped
        ));
        Ok(self.summarize(state))
    }

    fn warn_duplicate_ids(&mut self, jobs: &[Job]) {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        for job in jobs {
            if !seen.insert(job.id.as_str()) && reported.insert(job.id.as_str()) {
                self.logger.warning(format!(
                    "Duplicate job id {}: output file {} will be overwritten",
                    job.id,
                    job.output_file_name()
                ));
            }
        }
    }

    fn summarize(&self, state: RunState<'_>) -> RunSummary {
        RunSummary {
            label: self.logger.label().to_string(),
            concurrency: self.concurrency,
            counters: state.counters,
            peak_active: state.peak_active,
            interrupted: self.stop.is_stop_requested(),
            jobs: state.reports,
        }
    }
}
