//! Builds a ready-to-run scheduler from a `RunnerConfig`.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::config::{InputSource, RunnerConfig};
use crate::core::{
    FileLogSink, JobExecutor, ProgressReporter, RunLogger, RunnerError, Scheduler, StopHandle,
};
use crate::util::clock::now;

/// Create `dir` if absent and make it the process working directory.
///
/// # Errors
///
/// Returns the I/O error from creating or entering the directory.
pub fn prepare_work_dir(dir: &Path) -> io::Result<()> {
    if dir == Path::new(".") {
        return Ok(());
    }
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
        info!(dir = %dir.display(), "Created working directory");
    }
    std::env::set_current_dir(dir)?;
    debug!(dir = %dir.display(), "Changed working directory");
    Ok(())
}

/// Open the configured input as a line reader.
///
/// # Errors
///
/// Returns the I/O error when the input file cannot be opened.
pub fn open_input(source: &InputSource) -> io::Result<Box<dyn BufRead>> {
    match source {
        InputSource::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
        InputSource::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
    }
}

/// Build a scheduler for `cfg`: resolves the concurrency cap, opens the run
/// log in `work_dir` and attaches the progress bar unless `quiet`.
///
/// # Errors
///
/// - `RunnerError::InvalidConfig` if `cfg` does not validate
/// - `RunnerError::Io` if the log file cannot be created
pub fn build_scheduler<E>(
    cfg: &RunnerConfig,
    work_dir: &Path,
    executor: E,
    stop: StopHandle,
) -> Result<Scheduler<E>, RunnerError>
where
    E: JobExecutor,
{
    cfg.validate().map_err(RunnerError::InvalidConfig)?;

    let label = cfg.input_source().label();
    let sink = FileLogSink::create(work_dir, &label, &now())?;
    info!(log = %sink.path().display(), "Run log opened");
    let logger = RunLogger::new(label, Box::new(sink));

    let progress = if cfg.quiet {
        ProgressReporter::disabled()
    } else {
        ProgressReporter::stdout()
    };

    Ok(Scheduler::new(cfg.resolve_concurrency(), work_dir, executor, logger)?
        .with_progress(progress)
        .with_stop_handle(stop))
}
