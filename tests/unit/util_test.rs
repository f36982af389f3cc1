//! Tests for time formatting helpers

use chrono::{Local, TimeZone};
use jobrunner::core::FileLogSink;
use jobrunner::util::clock::{as_millis_u64, file_stamp, format_real, log_timestamp};
use std::time::Duration;

#[test]
fn test_log_timestamp_has_millis() {
    let at = Local.with_ymd_and_hms(2023, 11, 5, 9, 7, 3).unwrap();
    assert_eq!(log_timestamp(&at), "2023-11-05 09:07:03,000");
}

#[test]
fn test_log_file_name() {
    let at = Local.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(file_stamp(&at), "20230102030405");
    assert_eq!(FileLogSink::file_name("STDIN", &at), "STDIN.20230102030405.log");
}

#[test]
fn test_format_real_minutes() {
    assert_eq!(format_real(Duration::from_millis(125_250)), "2m5.250s");
}

#[test]
fn test_as_millis_u64() {
    assert_eq!(as_millis_u64(Duration::from_secs(2)), 2000);
}
