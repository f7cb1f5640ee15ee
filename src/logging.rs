use crate::app::AppResult;
use color_eyre::eyre::WrapErr;
use std::{fs, path::PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "appstake-tui.log";

/// `$APPSTAKE_TUI_LOG_DIR`, else the platform data directory, else the working directory.
pub fn log_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("APPSTAKE_TUI_LOG_DIR").filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("appstake-tui"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Route tracing output to a file; the terminal belongs to the UI. Keep the
/// guard alive until exit so buffered lines are flushed.
pub fn init() -> AppResult<WorkerGuard> {
    let dir = log_dir();
    fs::create_dir_all(&dir)
        .wrap_err_with(|| format!("failed to create log directory {}", dir.display()))?;
    let appender = tracing_appender::rolling::never(&dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}
