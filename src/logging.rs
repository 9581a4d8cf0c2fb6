//! File logging for the TUI.
//!
//! The terminal belongs to the interface, so logs go to
//! `~/.local/state/hiit/hiit.log` (or the platform data dir). The filter comes
//! from `HIIT_LOG` and defaults to `info`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app_dirs::AppDirs;

pub const LOG_ENV: &str = "HIIT_LOG";
pub const LOG_FILE: &str = "hiit.log";

/// Install the global subscriber.
///
/// The returned guard must live until exit so buffered lines are flushed.
/// Returns `None` (logging disabled) when no log directory is usable.
pub fn init() -> Option<WorkerGuard> {
    let dir = AppDirs::log_dir()?;
    init_in(&dir)
}

pub fn init_in(dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        // No subscriber yet, and stdout is about to become the TUI
        eprintln!("hiit: logging disabled, cannot create {}: {e}", dir.display());
        return None;
    }

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (e.g. in tests) keeps the first subscriber
    if tracing_subscriber::registry()
        .with(file_layer)
        .with(filter)
        .try_init()
        .is_err()
    {
        return None;
    }

    tracing::info!(log_file = ?log_path(dir), "hiit logging initialized");
    Some(guard)
}

pub fn log_path(dir: &Path) -> PathBuf {
    dir.join(LOG_FILE)
}
