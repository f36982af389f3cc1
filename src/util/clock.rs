//! Time formatting for log lines, log file names and timing footers.

use std::time::Duration;

use chrono::{DateTime, Local};

/// Current local time.
#[must_use]
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Timestamp used at the start of every log line, e.g.
/// `2014-08-23 10:04:05,123`.
#[must_use]
pub fn log_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S,%3f").to_string()
}

/// Second-precision stamp used in log file names, e.g. `20140823100405`.
#[must_use]
pub fn file_stamp(at: &DateTime<Local>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// Wall-clock duration in the shell `time` keyword layout, e.g. `1m2.500s`.
#[must_use]
pub fn format_real(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{}m{}.{millis:03}s", secs / 60, secs % 60)
}

/// Milliseconds in a duration, saturating at `u64::MAX`.
#[must_use]
pub fn as_millis_u64(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
