//! Tests for configuration validation and layering

use jobrunner::config::{InputSource, RunnerConfig, WorkerPoolConfig, ENV_CPU};
use std::path::PathBuf;

#[test]
fn test_runner_config_from_json() {
    let cfg = RunnerConfig::from_json_str(
        r#"{"input": "cmds.txt", "concurrency": 4, "work_dir": "out", "quiet": true}"#,
    )
    .unwrap();
    assert_eq!(cfg.resolve_concurrency(), 4);
    assert_eq!(cfg.work_dir(), PathBuf::from("out"));
    assert_eq!(cfg.input_source(), InputSource::File(PathBuf::from("cmds.txt")));
    assert!(cfg.quiet);
    assert!(cfg.summary_path.is_none());
}

#[test]
fn test_runner_config_defaults() {
    let cfg = RunnerConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg.input_source(), InputSource::Stdin);
    assert_eq!(cfg.work_dir(), PathBuf::from("."));
    assert!(cfg.resolve_concurrency() >= 1);
    assert!(!cfg.quiet);
}

#[test]
fn test_runner_config_rejects_zero_concurrency() {
    assert!(RunnerConfig::from_json_str(r#"{"concurrency": 0}"#).is_err());
}

#[test]
fn test_runner_config_rejects_bad_json() {
    let err = RunnerConfig::from_json_str("{not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_runner_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runner.json");
    std::fs::write(&path, r#"{"concurrency": 2, "summary_path": "summary.json"}"#).unwrap();

    let cfg = RunnerConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.concurrency, Some(2));
    assert_eq!(cfg.summary_path, Some(PathBuf::from("summary.json")));

    assert!(RunnerConfig::from_json_file(&dir.path().join("missing.json")).is_err());
}

#[test]
fn test_env_zero_concurrency_is_invalid() {
    let mut cfg = RunnerConfig::default();
    let result = cfg.apply_env(|key| (key == ENV_CPU).then(|| "0".to_string()));
    assert!(result.is_err());
}

#[test]
fn test_env_oversubscription_is_allowed() {
    let mut cfg = RunnerConfig::default();
    cfg.apply_env(|key| (key == ENV_CPU).then(|| "512".to_string()))
        .unwrap();
    assert_eq!(cfg.resolve_concurrency(), 512);
}

#[test]
fn test_worker_pool_config_validation() {
    assert!(WorkerPoolConfig::new().validate().is_ok());
    assert!(WorkerPoolConfig::new().with_worker_count(0).validate().is_err());
    assert!(WorkerPoolConfig::new().with_max_queue_depth(0).validate().is_err());

    let tiny_stack = WorkerPoolConfig {
        thread_stack_size: 1024,
        ..WorkerPoolConfig::default()
    };
    assert!(tiny_stack.validate().is_err());
}
