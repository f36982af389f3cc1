//! jobrunner CLI entry point.
//!
//! Usage:
//!   jobrunner -f cmds.txt               # run jobs from a file, one per CPU
//!   jobrunner -f STDIN -c 4 < cmds.txt  # read stdin, 4 at a time
//!   jobrunner -f cmds.txt -d results    # run inside ./results (created)
//!
//! Exit status: 0 when every job succeeded, 1 when any job failed or was
//! skipped, 2 on a fatal error.

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use tracing::warn;

use jobrunner::builders::{build_scheduler, open_input, prepare_work_dir};
use jobrunner::config::RunnerConfig;
use jobrunner::core::{read_jobs, AppResult, StopHandle};
use jobrunner::runtime::{install_ctrl_c, ShellExecutor};

const EXIT_JOBS_FAILED: u8 = 1;
const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    jobrunner::util::init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        print_help();
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Parsed command line.
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    cmd: Option<String>,
    cpu: Option<usize>,
    dir: Option<PathBuf>,
    quiet: bool,
    config: Option<PathBuf>,
    summary: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum Invocation {
    Help,
    Version,
    Run(CliArgs),
}

impl CliArgs {
    /// Command-line values win over file and environment values.
    fn apply_to(&self, cfg: &mut RunnerConfig) {
        if let Some(cmd) = &self.cmd {
            cfg.input = Some(cmd.clone());
        }
        if let Some(cpu) = self.cpu {
            cfg.concurrency = Some(cpu);
        }
        if let Some(dir) = &self.dir {
            cfg.work_dir = Some(dir.clone());
        }
        if self.quiet {
            cfg.quiet = true;
        }
        if let Some(summary) = &self.summary {
            cfg.summary_path = Some(summary.clone());
        }
    }
}

fn parse_args(args: &[String]) -> AppResult<Invocation> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        // Accept both `--opt value` and `--opt=value`.
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
            _ => (arg.as_str(), None),
        };
        let mut value = |name: &str| -> AppResult<String> {
            match inline.clone() {
                Some(v) => Ok(v),
                None => iter
                    .next()
                    .cloned()
                    .ok_or_else(|| anyhow!("{name} requires a value")),
            }
        };

        match flag {
            "-h" | "--help" => return Ok(Invocation::Help),
            "-V" | "--version" => return Ok(Invocation::Version),
            "-f" | "--cmd" => cli.cmd = Some(value(flag)?),
            "-c" | "--cpu" => {
                let raw = value(flag)?;
                let cpu = raw
                    .parse::<usize>()
                    .with_context(|| format!("{flag} expects a positive integer, got {raw:?}"))?;
                if cpu == 0 {
                    bail!("{flag} must be at least 1");
                }
                cli.cpu = Some(cpu);
            }
            "-d" | "--dir" => cli.dir = Some(PathBuf::from(value(flag)?)),
            "-q" | "--quiet" => cli.quiet = true,
            "--config" => cli.config = Some(PathBuf::from(value(flag)?)),
            "--summary" => cli.summary = Some(PathBuf::from(value(flag)?)),
            other => bail!("unknown option {other:?} (try --help)"),
        }
    }

    Ok(Invocation::Run(cli))
}

fn run(args: &[String]) -> AppResult<ExitCode> {
    let cli = match parse_args(args)? {
        Invocation::Help => {
            print_help();
            return Ok(ExitCode::SUCCESS);
        }
        Invocation::Version => {
            println!("jobrunner {}", env!("CARGO_PKG_VERSION"));
            return Ok(ExitCode::SUCCESS);
        }
        Invocation::Run(cli) => cli,
    };

    let mut cfg = match &cli.config {
        Some(path) => RunnerConfig::from_json_file(path).map_err(|e| anyhow!(e))?,
        None => RunnerConfig::default(),
    };
    cfg.apply_process_env().map_err(|e| anyhow!(e))?;
    cli.apply_to(&mut cfg);
    cfg.validate().map_err(|e| anyhow!("invalid configuration: {e}"))?;

    // Input and summary paths are relative to the launch directory, so
    // resolve them before switching into the working directory.
    let source = cfg.input_source();
    let reader = open_input(&source).with_context(|| format!("cannot open job list {source}"))?;
    let jobs = read_jobs(reader)?;
    let summary_path = cfg
        .summary_path
        .as_deref()
        .map(std::path::absolute)
        .transpose()
        .context("cannot resolve summary path")?;

    let work_dir = cfg.work_dir();
    prepare_work_dir(&work_dir)
        .with_context(|| format!("cannot use working directory {}", work_dir.display()))?;

    let stop = StopHandle::new();
    if let Err(e) = install_ctrl_c(stop.clone()) {
        warn!(error = %e, "Ctrl-C handling unavailable");
    }

    let scheduler = build_scheduler(&cfg, Path::new("."), ShellExecutor::new(), stop)?;
    let summary = scheduler.run(jobs)?;

    if let Some(path) = summary_path {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(&path, json)
            .with_context(|| format!("cannot write summary to {}", path.display()))?;
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_JOBS_FAILED)
    })
}

fn print_help() {
    println!(
        r"jobrunner - run shell commands in parallel, N at a time

USAGE:
    jobrunner [OPTIONS]

Each input line is `<job_id> <command...>`. The command runs through the
shell with stdout and stderr captured in `<job_id>.out`; a run log is
written to `<input>.<YYYYMMDDhhmmss>.log`.

OPTIONS:
    -f, --cmd <FILE>       File containing all commands (STDIN reads stdin)
    -c, --cpu <N>          Number of jobs to run at once (default: CPU count)
    -d, --dir <DIR>        Working/output directory, created if missing (default: .)
    -q, --quiet            Do not draw the progress bar
        --config <FILE>    JSON config file (input, concurrency, work_dir, quiet, summary_path)
        --summary <FILE>   Write a JSON run summary
    -h, --help             Show this help
    -V, --version          Show version

ENVIRONMENT:
    JOBRUNNER_CPU, JOBRUNNER_DIR, JOBRUNNER_QUIET   Defaults overridden by flags
    RUST_LOG                                        Diagnostic log filter

EXIT STATUS:
    0 all jobs succeeded, 1 some job failed or was skipped, 2 fatal error"
    );
}
