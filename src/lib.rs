//! # jobrunner
//!
//! A bounded-concurrency batch runner for lists of shell commands.
//!
//! Given lines of the form `<id> <command>`, the runner executes at most N
//! commands at a time as independent OS processes, captures each command's
//! output in `<id>.out`, appends every admission and outcome to a run log,
//! and draws a progress bar while it works.
//!
//! ## Key Features
//!
//! - **Hard concurrency cap**: one worker thread per slot, never more jobs in
//!   flight than slots
//! - **FIFO admission**: jobs start in input order; completion order is free
//! - **Failure isolation**: a failing (or unstartable) job never stops the rest
//! - **No polling**: workers block on their own process, the coordinator
//!   blocks on an event channel
//! - **Graceful interrupt**: a stop request skips queued jobs and lets
//!   running ones finish
//!
//! ## Usage
//!
//! ```rust,ignore
//! use jobrunner::core::{parse_lines, InMemoryLogSink, RunLogger, Scheduler};
//! use jobrunner::runtime::ShellExecutor;
//!
//! let jobs = parse_lines(["a echo hi", "b echo bye"])?;
//! let logger = RunLogger::new("demo", Box::new(InMemoryLogSink::new(100)));
//! let summary = Scheduler::new(2, "/tmp/out", ShellExecutor::new(), logger)?.run(jobs)?;
//! assert_eq!(summary.counters.succeeded, 2);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: jobs, parsing, worker pool, scheduler.
pub mod core;
/// Configuration models for runs and worker pools.
pub mod config;
/// Builders to construct run components from configuration.
pub mod builders;
/// Runtime adapters: shell execution and interrupt handling.
pub mod runtime;
/// Shared utilities.
pub mod util;
