//! Ctrl-C handling.

use std::thread;

use tracing::warn;

use crate::core::StopHandle;

/// Exit status used when a second interrupt aborts the runner.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Watch for Ctrl-C on a background thread.
///
/// The first interrupt requests a stop: queued jobs are skipped while
/// running ones finish. A second interrupt exits immediately with status
/// 130, leaving running jobs to the OS.
///
/// # Errors
///
/// Returns an error if the watcher runtime or thread cannot be created.
pub fn install_ctrl_c(stop: StopHandle) -> std::io::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            rt.block_on(async {
                if tokio::signal::ctrl_c().await.is_err() {
                    return;
                }
                warn!("Interrupt received: finishing running jobs, skipping the rest");
                stop.request_stop();

                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Second interrupt received: exiting");
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            });
        })?;
    Ok(())
}
