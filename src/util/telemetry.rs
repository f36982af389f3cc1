//! Telemetry helpers for structured logging and tracing.

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset or unparsable. Only genuine
/// errors reach stderr by default; job outcomes belong in the run log.
pub const DEFAULT_DIRECTIVE: &str = "error";

/// Build the diagnostic filter from a raw `RUST_LOG` value.
#[must_use]
pub fn env_filter(raw: Option<&str>) -> EnvFilter {
    raw.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Initialize tracing/telemetry. Users can install their own subscriber; this
/// helper installs a default env-based subscriber if none is set.
///
/// Diagnostics go to stderr so they never interleave with the progress bar
/// on stdout.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let raw = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(raw.as_deref()))
        .with_writer(std::io::stderr)
        .try_init();
}
