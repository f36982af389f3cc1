//! Run-scoped log sinks.
//!
//! A `RunLogger` is built once per run and handed to the scheduler. Entries
//! go to a `LogSink` (a `<label>.<stamp>.log` file in production, a shared
//! in-memory buffer in tests) and are mirrored as `tracing` events.

use std::collections::VecDeque;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::util::clock::{file_stamp, log_timestamp, now};

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    Info,
    /// Something unusual that did not fail a job.
    Warning,
    /// A job failed.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// One appended log line.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// When the entry was recorded.
    pub timestamp: DateTime<Local>,
    /// Run label (input file name or `STDIN`).
    pub label: String,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable text.
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} - {}",
            log_timestamp(&self.timestamp),
            self.label,
            self.level,
            self.message
        )
    }
}

/// Destination for log entries.
pub trait LogSink: Send {
    /// Append an entry.
    fn record(&mut self, entry: &LogEntry);
}

/// Appends formatted entries to a file, one per line.
pub struct FileLogSink {
    path: PathBuf,
    file: File,
}

impl FileLogSink {
    /// File name for a run log: `<label>.<YYYYMMDDhhmmss>.log`.
    #[must_use]
    pub fn file_name(label: &str, at: &DateTime<Local>) -> String {
        format!("{label}.{}.log", file_stamp(at))
    }

    /// Create (or append to) the run log for `label` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the file cannot be opened.
    pub fn create(dir: &Path, label: &str, at: &DateTime<Local>) -> io::Result<Self> {
        let path = dir.join(Self::file_name(label, at));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "Opened run log");
        Ok(Self { path, file })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileLogSink {
    fn record(&mut self, entry: &LogEntry) {
        if let Err(e) = writeln!(self.file, "{entry}") {
            error!(path = %self.path.display(), error = %e, "Failed to append to run log");
        }
    }
}

/// In-memory sink for tests and dev. Clones share the same buffer, so a test
/// can keep one handle and give the other to the scheduler.
#[derive(Clone)]
pub struct InMemoryLogSink {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    max_entries: usize,
}

impl InMemoryLogSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(max_entries.min(1024)))),
            max_entries,
        }
    }

    /// Retrieve a snapshot of stored entries.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Messages only, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.message.clone()).collect()
    }
}

impl LogSink for InMemoryLogSink {
    fn record(&mut self, entry: &LogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry.clone());
    }
}

/// Discards everything.
pub struct NullLogSink;

impl LogSink for NullLogSink {
    fn record(&mut self, _entry: &LogEntry) {}
}

/// Explicit per-run logger.
pub struct RunLogger {
    label: String,
    sink: Box<dyn LogSink>,
}

impl RunLogger {
    /// Wrap a sink under a run label.
    #[must_use]
    pub fn new(label: impl Into<String>, sink: Box<dyn LogSink>) -> Self {
        Self {
            label: label.into(),
            sink,
        }
    }

    /// Run label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Record an entry at `level`.
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry {
            timestamp: now(),
            label: self.label.clone(),
            level,
            message: message.into(),
        };
        // Debug only: stderr shares the terminal with the progress bar.
        debug!(run = %entry.label, level = %level, "{}", entry.message);
        self.sink.record(&entry);
    }

    /// Record at INFO.
    pub fn info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    /// Record at WARNING.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }

    /// Record at ERROR.
    pub fn error(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }
}
