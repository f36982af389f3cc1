//! Integration tests for WorkerPool
//!
//! These tests validate the pool on its own, without a scheduler:
//! - Event ordering per job (Started before Finished)
//! - Worker count bounding concurrency
//! - Queue limits and shutdown
//! - Stop requests turning queued jobs into skips

use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver};
use jobrunner::config::WorkerPoolConfig;
use jobrunner::core::{
    Job, JobContext, JobExecutor, JobFailure, JobOutcome, PoolError, StopHandle, WorkerEvent,
    WorkerPool,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// TEST EXECUTORS
// ============================================================================

/// Sleeps for a fixed time and fails jobs whose id starts with `fail`.
#[derive(Clone)]
struct SleepExecutor {
    work_ms: u64,
    active: Arc<AtomicU64>,
    peak: Arc<AtomicU64>,
}

impl SleepExecutor {
    fn new(work_ms: u64) -> Self {
        Self {
            work_ms,
            active: Arc::new(AtomicU64::new(0)),
            peak: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl JobExecutor for SleepExecutor {
    async fn execute(&self, job: &Job, _ctx: &JobContext) -> JobOutcome {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(self.work_ms)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        let elapsed = Duration::from_millis(self.work_ms);
        if job.id.starts_with("fail") {
            JobOutcome::Failed {
                failure: JobFailure::ExitCode(1),
                elapsed,
            }
        } else {
            JobOutcome::Succeeded { elapsed }
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn pool_with(
    workers: usize,
    depth: usize,
    executor: SleepExecutor,
) -> (WorkerPool<SleepExecutor>, Receiver<WorkerEvent>, StopHandle) {
    let (tx, rx) = unbounded();
    let stop = StopHandle::new();
    let config = WorkerPoolConfig::new()
        .with_worker_count(workers)
        .with_max_queue_depth(depth)
        .with_work_dir(std::env::temp_dir());
    let pool = WorkerPool::new(config, executor, tx, stop.clone()).unwrap();
    (pool, rx, stop)
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_every_job_starts_then_finishes() {
    let (pool, rx, _stop) = pool_with(2, 16, SleepExecutor::new(10));
    for seq in 0..6 {
        let id = if seq == 3 { "fail3".to_string() } else { format!("job{seq}") };
        pool.submit(seq, Job::new(id, "work")).unwrap();
    }
    pool.close();

    // Channel disconnects once all workers are done.
    let events: Vec<WorkerEvent> = rx.iter().collect();
    assert_eq!(pool.join(), 0);
    assert_eq!(events.len(), 12);

    let mut seen: HashMap<usize, Vec<&WorkerEvent>> = HashMap::new();
    for event in &events {
        let seq = match event {
            WorkerEvent::Started { seq, .. }
            | WorkerEvent::Finished { seq, .. }
            | WorkerEvent::Skipped { seq } => *seq,
        };
        seen.entry(seq).or_default().push(event);
    }
    for seq in 0..6 {
        let per_job = &seen[&seq];
        assert_eq!(per_job.len(), 2);
        assert!(matches!(per_job[0], WorkerEvent::Started { .. }));
        assert!(matches!(per_job[1], WorkerEvent::Finished { .. }));
    }

    let stats = pool.stats();
    assert_eq!(stats.worker_count, 2);
    assert_eq!(stats.submitted_tasks, 6);
    assert_eq!(stats.completed_tasks, 5);
    assert_eq!(stats.failed_tasks, 1);
    assert_eq!(stats.active_tasks, 0);
    assert_eq!(stats.queued_tasks, 0);
}

#[test]
fn test_worker_count_bounds_concurrency() {
    let executor = SleepExecutor::new(30);
    let peak = Arc::clone(&executor.peak);
    let (pool, rx, _stop) = pool_with(3, 32, executor);
    for seq in 0..10 {
        pool.submit(seq, Job::new(format!("j{seq}"), "work")).unwrap();
    }
    pool.close();
    let finished = rx
        .iter()
        .filter(|e| matches!(e, WorkerEvent::Finished { .. }))
        .count();
    pool.join();

    assert_eq!(finished, 10);
    assert!(peak.load(Ordering::SeqCst) <= 3);
}

#[test]
fn test_single_worker_starts_in_submission_order() {
    let (pool, rx, _stop) = pool_with(1, 8, SleepExecutor::new(1));
    for seq in 0..5 {
        pool.submit(seq, Job::new(format!("j{seq}"), "work")).unwrap();
    }
    pool.close();
    let started: Vec<usize> = rx
        .iter()
        .filter_map(|e| match e {
            WorkerEvent::Started { seq, .. } => Some(seq),
            _ => None,
        })
        .collect();
    pool.join();
    assert_eq!(started, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_queue_full_is_reported() {
    let (pool, rx, _stop) = pool_with(1, 1, SleepExecutor::new(200));
    let results: Vec<_> = (0..3)
        .map(|seq| pool.submit(seq, Job::new(format!("j{seq}"), "work")))
        .collect();
    assert!(results.iter().any(|r| matches!(r, Err(PoolError::QueueFull))));

    pool.close();
    drop(rx);
    pool.join();
}

#[test]
fn test_submit_after_close_is_rejected() {
    let (pool, _rx, _stop) = pool_with(1, 4, SleepExecutor::new(1));
    pool.close();
    assert!(matches!(
        pool.submit(0, Job::new("late", "work")),
        Err(PoolError::PoolShutdown)
    ));
    assert_eq!(pool.join(), 0);
}

#[test]
fn test_stop_skips_queued_jobs() {
    let (pool, rx, stop) = pool_with(1, 8, SleepExecutor::new(1));
    stop.request_stop();
    for seq in 0..3 {
        pool.submit(seq, Job::new(format!("j{seq}"), "work")).unwrap();
    }
    pool.close();
    let events: Vec<WorkerEvent> = rx.iter().collect();
    pool.join();

    assert_eq!(
        events,
        vec![
            WorkerEvent::Skipped { seq: 0 },
            WorkerEvent::Skipped { seq: 1 },
            WorkerEvent::Skipped { seq: 2 },
        ]
    );
    assert_eq!(pool.stats().skipped_tasks, 3);
    assert!(stop.is_stop_requested());
}

#[test]
fn test_invalid_config_is_rejected() {
    let (tx, _rx) = unbounded();
    let config = WorkerPoolConfig::new().with_worker_count(0);
    let result = WorkerPool::new(config, SleepExecutor::new(1), tx, StopHandle::new());
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}
