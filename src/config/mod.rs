//! Configuration models for runs and worker pools.

pub mod pool;
pub mod runner;

pub use pool::WorkerPoolConfig;
pub use runner::{InputSource, RunnerConfig, ENV_CPU, ENV_DIR, ENV_QUIET, STDIN_SENTINEL};
