//! Run-level configuration: file, environment and command-line layers.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::capacity::detect_capacity;

/// Input value that selects standard input.
pub const STDIN_SENTINEL: &str = "STDIN";

/// Environment variable overriding the concurrency cap.
pub const ENV_CPU: &str = "JOBRUNNER_CPU";
/// Environment variable overriding the working directory.
pub const ENV_DIR: &str = "JOBRUNNER_DIR";
/// Environment variable disabling the progress bar when truthy.
pub const ENV_QUIET: &str = "JOBRUNNER_QUIET";

/// Where job lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Standard input.
    Stdin,
    /// A file of job lines.
    File(PathBuf),
}

impl InputSource {
    /// Interpret a `--cmd` value: `STDIN` or an empty string select stdin.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value == STDIN_SENTINEL {
            Self::Stdin
        } else {
            Self::File(PathBuf::from(value))
        }
    }

    /// Label naming the run and its log file: the input's file name, or
    /// `STDIN`.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Stdin => STDIN_SENTINEL.to_string(),
            Self::File(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str(STDIN_SENTINEL),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Runner configuration. Every field is optional so layers can be merged:
/// JSON file, then environment, then command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Input file path, or `STDIN`.
    pub input: Option<String>,
    /// Concurrency cap; detected from the CPU count when unset.
    pub concurrency: Option<usize>,
    /// Working directory, created if absent.
    pub work_dir: Option<PathBuf>,
    /// Disable the progress bar.
    pub quiet: bool,
    /// Write a JSON run summary here when set.
    pub summary_path: Option<PathBuf>,
}

impl RunnerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("concurrency must be greater than 0".into());
        }
        if self.work_dir.as_deref().is_some_and(|d| d.as_os_str().is_empty()) {
            return Err("work_dir must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns a read, parse or validation message.
    pub fn from_json_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Overlay values found through `lookup` (normally the process
    /// environment).
    ///
    /// # Errors
    ///
    /// Returns a message when a variable is present but unparsable.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), String>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_CPU) {
            let n = raw
                .trim()
                .parse::<usize>()
                .map_err(|e| format!("{ENV_CPU}={raw:?}: {e}"))?;
            self.concurrency = Some(n);
        }
        if let Some(dir) = lookup(ENV_DIR) {
            self.work_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup(ENV_QUIET) {
            self.quiet = matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        self.validate()
    }

    /// Load a `.env` file if present, then overlay the process environment.
    ///
    /// # Errors
    ///
    /// See [`RunnerConfig::apply_env`].
    pub fn apply_process_env(&mut self) -> Result<(), String> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Concurrency cap for the run: the override if set, else the host CPU
    /// count. Overrides are not capped at the core count.
    #[must_use]
    pub fn resolve_concurrency(&self) -> usize {
        self.concurrency.unwrap_or_else(detect_capacity)
    }

    /// Selected input; standard input when unset.
    #[must_use]
    pub fn input_source(&self) -> InputSource {
        self.input.as_deref().map_or(InputSource::Stdin, InputSource::parse)
    }

    /// Working directory; `.` when unset.
    #[must_use]
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
