//! Diagnostics go to a daily rolling file; the terminal belongs to the UI.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::defaults::Defaults;

/// Installs the global subscriber. `RUST_LOG` wins over `level`. Keep the
/// returned guard alive until exit or buffered lines are lost.
pub fn init(level: &str, dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(dir).with_context(|| format!("creating log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(Defaults::LOG_FILE_PREFIX)
        .filename_suffix(Defaults::LOG_FILE_SUFFIX)
        .max_log_files(Defaults::LOG_FILES_KEPT)
        .build(dir)
        .context("creating log file appender")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(false))
        .try_init()
        .context("installing log subscriber")?;

    Ok(guard)
}
