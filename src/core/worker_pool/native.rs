//! Native implementation of `WorkerPool` using OS threads.
//!
//! Each worker owns a single-threaded tokio runtime and awaits its job's
//! process exit there, so a worker is blocked for exactly as long as its
//! subprocess runs.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel recv and on process exit
//! - **FIFO admission**: one shared queue, dequeued in submission order
//! - **Clean shutdown**: dropping the sender lets workers drain and exit

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::executor::{JobContext, JobExecutor};
use crate::core::{JobFailure, JobOutcome};

use super::{PoolCounters, PoolError, PoolStats, StopHandle, WorkerEvent, WorkerTask};

/// Worker pool with dedicated OS threads, one per concurrency slot.
pub struct WorkerPool<E>
where
    E: JobExecutor,
{
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Job sender (to workers). Option allows clean shutdown by dropping.
    task_tx: Mutex<Option<Sender<WorkerTask>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,

    /// Phantom data for executor type.
    _executor: std::marker::PhantomData<E>,
}

impl<E> WorkerPool<E>
where
    E: JobExecutor,
{
    /// Create a new worker pool and spawn `config.worker_count` threads.
    ///
    /// Every worker holds a clone of `events`; the channel disconnects once
    /// all workers have exited.
    ///
    /// # Errors
    ///
    /// - `PoolError::InvalidConfig` if the configuration is invalid
    /// - `PoolError::Internal` if a worker thread cannot be spawned
    pub fn new(
        config: WorkerPoolConfig,
        executor: E,
        events: Sender<WorkerEvent>,
        stop: StopHandle,
    ) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (task_tx, task_rx) = bounded::<WorkerTask>(config.max_queue_depth);
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let ctx = WorkerContext {
                worker_id,
                task_rx: task_rx.clone(),
                events: events.clone(),
                counters: Arc::clone(&counters),
                stop: stop.clone(),
                config: config.clone(),
            };
            match spawn_worker(ctx, executor.clone()) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Close the queue so already-spawned workers exit.
                    drop(task_tx);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(PoolError::Internal(format!(
                        "failed to spawn worker {worker_id}: {e}"
                    )));
                }
            }
        }

        info!(
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            work_dir = %config.work_dir.display(),
            "WorkerPool initialized with dedicated OS threads"
        );

        Ok(Self {
            config,
            task_tx: Mutex::new(Some(task_tx)),
            counters,
            workers: Mutex::new(workers),
            _executor: std::marker::PhantomData,
        })
    }

    /// Queue a job. Jobs are started in submission order.
    ///
    /// # Errors
    ///
    /// - `PoolError::QueueFull` if the queue is full
    /// - `PoolError::PoolShutdown` if the pool has been closed
    pub fn submit(&self, seq: usize, job: crate::core::Job) -> Result<(), PoolError> {
        let task_tx_guard = self.task_tx.lock();
        let Some(task_tx) = task_tx_guard.as_ref() else {
            return Err(PoolError::PoolShutdown);
        };

        // Count before sending so a fast worker never decrements below zero.
        self.counters.queued_tasks.fetch_add(1, Ordering::Relaxed);
        match task_tx.try_send(WorkerTask { seq, job }) {
            Ok(()) => {
                self.counters.submitted_tasks.fetch_add(1, Ordering::Relaxed);
                debug!(seq, "Job submitted to worker pool");
                Ok(())
            }
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                warn!("Worker pool queue is full");
                Err(PoolError::QueueFull)
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                self.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
                Err(PoolError::PoolShutdown)
            }
        }
    }

    /// Stop accepting jobs. Workers finish everything already queued, then
    /// exit.
    pub fn close(&self) {
        let mut task_tx = self.task_tx.lock();
        if task_tx.take().is_some() {
            debug!("Worker pool queue closed");
        }
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Close the queue and wait for every worker to exit. Returns the number
    /// of workers that panicked.
    pub fn join(&self) -> usize {
        self.close();

        let mut workers = self.workers.lock();
        let mut panicked = 0;
        for (idx, worker) in workers.drain(..).enumerate() {
            if worker.join().is_ok() {
                debug!(worker_id = idx, "Worker joined successfully");
            } else {
                warn!(worker_id = idx, "Worker panicked");
                panicked += 1;
            }
        }
        info!(worker_count = self.config.worker_count, panicked, "Worker pool shut down complete");
        panicked
    }
}

impl<E> Drop for WorkerPool<E>
where
    E: JobExecutor,
{
    fn drop(&mut self) {
        // Close the queue but don't join: running jobs may take arbitrarily
        // long and workers exit on their own once drained.
        let mut task_tx = self.task_tx.lock();
        if task_tx.take().is_some() {
            debug!("WorkerPool dropped without explicit join - workers will be detached");
        }
    }
}

/// Everything a worker thread owns.
struct WorkerContext {
    worker_id: usize,
    task_rx: Receiver<WorkerTask>,
    events: Sender<WorkerEvent>,
    counters: Arc<PoolCounters>,
    stop: StopHandle,
    config: WorkerPoolConfig,
}

/// Spawn a worker thread.
fn spawn_worker<E>(ctx: WorkerContext, executor: E) -> std::io::Result<JoinHandle<()>>
where
    E: JobExecutor,
{
    thread::Builder::new()
        .name(format!("job-worker-{}", ctx.worker_id))
        .stack_size(ctx.config.thread_stack_size)
        .spawn(move || worker_loop(&ctx, &executor))
}

fn worker_loop<E>(ctx: &WorkerContext, executor: &E)
where
    E: JobExecutor,
{
    let worker_id = ctx.worker_id;
    debug!(worker_id, "Worker thread started");

    // Each worker has its own single-threaded tokio runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error!(worker_id, error = %e, "Failed to create worker runtime");
            e.to_string()
        });

    // Blocking recv; returns Err once the sender is dropped and the queue
    // is drained.
    while let Ok(task) = ctx.task_rx.recv() {
        ctx.counters.queued_tasks.fetch_sub(1, Ordering::Relaxed);
        let seq = task.seq;

        if ctx.stop.is_stop_requested() {
            debug!(worker_id, seq, job_id = %task.job.id, "Stop requested, skipping job");
            ctx.counters.skipped_tasks.fetch_add(1, Ordering::Relaxed);
            if ctx.events.send(WorkerEvent::Skipped { seq }).is_err() {
                break;
            }
            continue;
        }

        ctx.counters.active_tasks.fetch_add(1, Ordering::Relaxed);
        if ctx.events.send(WorkerEvent::Started { seq, worker_id }).is_err() {
            warn!(worker_id, "Coordinator gone, worker exiting");
            ctx.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
            break;
        }

        let job_ctx = JobContext::for_job(&task.job, &ctx.config.work_dir, worker_id);
        debug!(worker_id, seq, job_id = %task.job.id, "Worker executing job");
        let outcome = match &rt {
            Ok(rt) => rt.block_on(executor.execute(&task.job, &job_ctx)),
            Err(reason) => {
                let started = Instant::now();
                JobOutcome::Failed {
                    failure: JobFailure::Spawn(format!("worker runtime unavailable: {reason}")),
                    elapsed: started.elapsed(),
                }
            }
        };
        debug!(worker_id, seq, status = ?outcome.status(), "Worker completed job");

        ctx.counters.active_tasks.fetch_sub(1, Ordering::Relaxed);
        match outcome {
            JobOutcome::Succeeded { .. } => &ctx.counters.completed_tasks,
            JobOutcome::Failed { .. } => &ctx.counters.failed_tasks,
        }
        .fetch_add(1, Ordering::Relaxed);

        if ctx.events.send(WorkerEvent::Finished { seq, outcome }).is_err() {
            break;
        }
    }

    debug!(worker_id, "Worker thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Job;
    use async_trait::async_trait;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Test executor that counts executions and fails jobs named `bad`.
    #[derive(Clone)]
    struct TestExecutor {
        execution_count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobExecutor for TestExecutor {
        async fn execute(&self, job: &Job, _ctx: &JobContext) -> JobOutcome {
            self.execution_count.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(Duration::from_millis(10)).await;
            if job.id == "bad" {
                JobOutcome::Failed {
                    failure: JobFailure::ExitCode(1),
                    elapsed: Duration::from_millis(10),
                }
            } else {
                JobOutcome::Succeeded {
                    elapsed: Duration::from_millis(10),
                }
            }
        }
    }

    fn executor() -> TestExecutor {
        TestExecutor {
            execution_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[test]
    fn test_worker_pool_runs_all_jobs() {
        let exec = executor();
        let (tx, rx) = unbounded();
        let config = WorkerPoolConfig::new().with_worker_count(2).with_max_queue_depth(10);
        let pool = WorkerPool::new(config, exec.clone(), tx, StopHandle::new()).unwrap();

        for (seq, id) in ["a", "bad", "c"].into_iter().enumerate() {
            pool.submit(seq, Job::new(id, "true")).unwrap();
        }
        pool.close();

        let events: Vec<_> = rx.iter().collect();
        let finished = events
            .iter()
            .filter(|e| matches!(e, WorkerEvent::Finished { .. }))
            .count();
        assert_eq!(finished, 3);
        assert_eq!(pool.join(), 0);

        let stats = pool.stats();
        assert_eq!(stats.submitted_tasks, 3);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.failed_tasks, 1);
        assert_eq!(stats.active_tasks, 0);
        assert_eq!(stats.queued_tasks, 0);
        assert_eq!(exec.execution_count.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_submit_after_close_is_rejected() {
        let (tx, _rx) = unbounded();
        let pool = WorkerPool::new(WorkerPoolConfig::new(), executor(), tx, StopHandle::new()).unwrap();
        pool.close();
        assert!(matches!(pool.submit(0, Job::new("a", "true")), Err(PoolError::PoolShutdown)));
        pool.join();
    }

    #[test]
    fn test_zero_workers_is_invalid() {
        let (tx, _rx) = unbounded();
        let config = WorkerPoolConfig::new().with_worker_count(0);
        let result = WorkerPool::new(config, executor(), tx, StopHandle::new());
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_stop_skips_queued_jobs() {
        let exec = executor();
        let (tx, rx) = unbounded();
        let stop = StopHandle::new();
        stop.request_stop();
        let pool = WorkerPool::new(WorkerPoolConfig::new(), exec.clone(), tx, stop).unwrap();
        pool.submit(0, Job::new("a", "true")).unwrap();
        pool.close();

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events, vec![WorkerEvent::Skipped { seq: 0 }]);
        pool.join();
        assert_eq!(exec.execution_count.load(Ordering::Relaxed), 0);
        assert_eq!(pool.stats().skipped_tasks, 1);
    }
}
