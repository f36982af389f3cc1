//! Builders to construct run components from configuration.

pub mod run_builder;

pub use run_builder::{build_scheduler, open_input, prepare_work_dir};
