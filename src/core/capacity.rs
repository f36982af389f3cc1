//! Default concurrency from the host CPU count.

/// Concurrency hint for this host. Always at least 1.
#[must_use]
pub fn detect_capacity() -> usize {
    #[cfg(windows)]
    {
        parse_processor_count(std::env::var("NUMBER_OF_PROCESSORS").ok().as_deref())
    }
    #[cfg(not(windows))]
    {
        num_cpus::get().max(1)
    }
}

/// Interpret a processor-count string, falling back to 1 when it is missing,
/// unparsable, or zero.
#[must_use]
pub fn parse_processor_count(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}
