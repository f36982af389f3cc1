//! Shell executor: runs each job through the platform shell with stdout and
//! stderr captured in the job's output file.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::executor::{JobContext, JobExecutor};
use crate::core::{Job, JobFailure, JobOutcome};
use crate::util::clock::format_real;

#[cfg(unix)]
const DEFAULT_SHELL: (&str, &str) = ("sh", "-c");
#[cfg(windows)]
const DEFAULT_SHELL: (&str, &str) = ("cmd", "/C");

/// Runs jobs as `<shell> <flag> <command>` via `tokio::process`.
///
/// The output file is created (or truncated) before launch and receives both
/// streams. Unless disabled, a `real<TAB>XmY.ZZZs` wall-clock footer is
/// appended after the process exits, in the layout of the shell `time`
/// keyword.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
    flag: String,
    timing_footer: bool,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.0.to_string(),
            flag: DEFAULT_SHELL.1.to_string(),
            timing_footer: true,
        }
    }
}

impl ShellExecutor {
    /// Executor using the platform shell (`sh -c`, or `cmd /C` on Windows).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different shell and command flag, e.g. `("bash", "-c")`.
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>, flag: impl Into<String>) -> Self {
        self.shell = shell.into();
        self.flag = flag.into();
        self
    }

    /// Do not append the timing footer.
    #[must_use]
    pub const fn without_timing(mut self) -> Self {
        self.timing_footer = false;
        self
    }

    fn append_footer(&self, ctx: &JobContext, started: Instant) {
        if !self.timing_footer {
            return;
        }
        let footer = format!("\nreal\t{}\n", format_real(started.elapsed()));
        let result = OpenOptions::new()
            .append(true)
            .open(&ctx.output_path)
            .and_then(|mut f| f.write_all(footer.as_bytes()));
        if let Err(e) = result {
            warn!(path = %ctx.output_path.display(), error = %e, "Failed to append timing footer");
        }
    }
}

/// Map an exit status onto success or a failure class.
fn classify(status: ExitStatus) -> Result<(), JobFailure> {
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(JobFailure::ExitCode(code));
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(JobFailure::Signal(signal));
        }
    }
    Err(JobFailure::ExitCode(-1))
}

#[async_trait]
impl JobExecutor for ShellExecutor {
    async fn execute(&self, job: &Job, ctx: &JobContext) -> JobOutcome {
        let started = Instant::now();
        let spawn_failed = |reason: String| JobOutcome::Failed {
            failure: JobFailure::Spawn(reason),
            elapsed: started.elapsed(),
        };

        let (stdout, stderr) = match File::create(&ctx.output_path)
            .and_then(|out| out.try_clone().map(|err| (out, err)))
        {
            Ok(pair) => pair,
            Err(e) => {
                return spawn_failed(format!(
                    "cannot create output file {}: {e}",
                    ctx.output_path.display()
                ))
            }
        };

        let mut cmd = Command::new(&self.shell);
        cmd.arg(&self.flag)
            .arg(&job.command)
            .current_dir(&ctx.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr));

        // Own process group: a terminal Ctrl-C stops admission but must not
        // reach jobs that are already running.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return spawn_failed(format!("{} {}: {e}", self.shell, self.flag)),
        };
        debug!(job_id = %job.id, pid = ?child.id(), worker_id = ctx.worker_id, "Spawned job process");

        // Drop our copies of the output handles; the child holds its own.
        drop(cmd);

        let status = match child.wait().await {
            Ok(status) => status,
            Err(e) => return spawn_failed(format!("failed to wait for process: {e}")),
        };
        self.append_footer(ctx, started);

        let elapsed = started.elapsed();
        match classify(status) {
            Ok(()) => JobOutcome::Succeeded { elapsed },
            Err(failure) => JobOutcome::Failed { failure, elapsed },
        }
    }
}
