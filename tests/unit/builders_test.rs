//! Tests for the run builders

use jobrunner::builders::{build_scheduler, open_input, prepare_work_dir};
use jobrunner::config::{InputSource, RunnerConfig};
use jobrunner::core::{read_jobs, StopHandle};
use jobrunner::runtime::ShellExecutor;
use std::io::Write;
use std::path::Path;

#[test]
fn test_open_input_reads_job_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "a echo one").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "b echo two").unwrap();

    let source = InputSource::File(file.path().to_path_buf());
    let jobs = read_jobs(open_input(&source).unwrap()).unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1].id, "b");
    assert_eq!(jobs[1].command, "echo two");
}

#[test]
fn test_open_input_missing_file() {
    let source = InputSource::File("/definitely/not/here/cmds.txt".into());
    assert!(open_input(&source).is_err());
}

#[test]
fn test_prepare_current_dir_is_noop() {
    let before = std::env::current_dir().unwrap();
    prepare_work_dir(Path::new(".")).unwrap();
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[test]
fn test_build_scheduler_creates_run_log() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = RunnerConfig {
        input: Some("nightly/cmds.txt".into()),
        concurrency: Some(3),
        quiet: true,
        ..RunnerConfig::default()
    };
    let scheduler = build_scheduler(&cfg, dir.path(), ShellExecutor::new(), StopHandle::new()).unwrap();
    assert_eq!(scheduler.concurrency(), 3);

    let logs: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].starts_with("cmds.txt."));
    assert!(logs[0].ends_with(".log"));
}

#[test]
fn test_build_scheduler_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = RunnerConfig {
        concurrency: Some(0),
        ..RunnerConfig::default()
    };
    assert!(build_scheduler(&cfg, dir.path(), ShellExecutor::new(), StopHandle::new()).is_err());
}
