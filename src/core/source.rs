//! Parsing of `<id> <command>` job lines.

use std::io::BufRead;

use tracing::debug;

use super::{Job, RunnerError};

/// Parse one raw line. Returns `Ok(None)` for blank lines.
///
/// The line is split at its first whitespace run; everything after that run
/// is the command, kept verbatim.
///
/// # Errors
///
/// Returns `RunnerError::MalformedJobLine` when the line has no whitespace
/// separator or the command after it is empty.
pub fn parse_line(line_number: usize, raw: &str) -> Result<Option<Job>, RunnerError> {
    let line = raw.trim_end_matches(['\n', '\r']);
    let trimmed = line.trim_start();
    if trimmed.trim_end().is_empty() {
        debug!(line_number, "Skipping blank job line");
        return Ok(None);
    }

    let malformed = || RunnerError::MalformedJobLine {
        line_number,
        line: line.to_string(),
    };

    let (id, rest) = trimmed.split_once(char::is_whitespace).ok_or_else(malformed)?;
    let command = rest.trim_start();
    if command.trim_end().is_empty() {
        return Err(malformed());
    }
    Ok(Some(Job::new(id, command)))
}

/// Parse a sequence of lines in order. The first malformed line aborts.
///
/// # Errors
///
/// Propagates the first `MalformedJobLine`.
pub fn parse_lines<I, S>(lines: I) -> Result<Vec<Job>, RunnerError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut jobs = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        if let Some(job) = parse_line(idx + 1, line.as_ref())? {
            jobs.push(job);
        }
    }
    Ok(jobs)
}

/// Read and parse every line from a reader (stdin or a file).
///
/// # Errors
///
/// Returns `RunnerError::Io` on read failures and `MalformedJobLine` on bad
/// input.
pub fn read_jobs<R: BufRead>(reader: R) -> Result<Vec<Job>, RunnerError> {
    let lines = reader.lines().collect::<Result<Vec<_>, _>>()?;
    let jobs = parse_lines(&lines)?;
    debug!(lines = lines.len(), jobs = jobs.len(), "Parsed job list");
    Ok(jobs)
}
