//! Runtime adapters: process execution and interrupt handling on tokio.

pub mod shell;
pub mod signal;

pub use shell::ShellExecutor;
pub use signal::install_ctrl_c;
