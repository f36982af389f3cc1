//! Tests for error types

use jobrunner::core::{JobFailure, PoolError, RunnerError};

#[test]
fn test_malformed_line_error() {
    let err = RunnerError::MalformedJobLine {
        line_number: 4,
        line: "lonely".to_string(),
    };
    assert_eq!(
        format!("{}", err),
        "malformed job line 4: \"lonely\" (expected `<id> <command>`)"
    );
}

#[test]
fn test_invalid_config_error() {
    let err = RunnerError::InvalidConfig("concurrency must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: concurrency must be greater than 0"
    );
}

#[test]
fn test_pool_error_converts() {
    let err: RunnerError = PoolError::QueueFull.into();
    assert!(matches!(err, RunnerError::Pool(PoolError::QueueFull)));
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: RunnerError = io.into();
    assert_eq!(format!("{}", err), "io error: gone");
}

#[test]
fn test_job_failure_messages() {
    assert_eq!(
        JobFailure::ExitCode(3).to_string(),
        "finished with ERROR CODE 3"
    );
    assert_eq!(
        JobFailure::Signal(9).to_string(),
        "was terminated by signal 9"
    );
    assert_eq!(
        JobFailure::Spawn("no such file".into()).to_string(),
        "could not be started: no such file"
    );
}

#[test]
fn test_job_failure_exit_code() {
    assert_eq!(JobFailure::ExitCode(127).exit_code(), Some(127));
    assert_eq!(JobFailure::Signal(15).exit_code(), None);
    assert_eq!(JobFailure::Lost.exit_code(), None);
}
