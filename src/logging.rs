//! Logging setup.
//!
//! The TUI owns the terminal, so interactive sessions log to a file. One-shot
//! lookups log to stderr.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR_NAME: &str = "stakeout-mapper";
const LOG_FILE_NAME: &str = "stakeout-mapper.log";

/// Map the count of `-v` flags to a level.
pub fn level_for(verbose: u8) -> Level {
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// `~/.local/share/stakeout-mapper/stakeout-mapper.log` or the platform equivalent.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(LOG_DIR_NAME).join(LOG_FILE_NAME))
}

fn env_filter(level: Level) -> EnvFilter {
    // RUST_LOG wins over the -v flags.
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("stakeout_mapper={level}")))
}

/// Append log lines to `path`, creating parent directories as needed.
pub fn init_file_logging(path: &Path, level: Level) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;

    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init();
    Ok(())
}

pub fn init_stderr_logging(level: Level) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
