use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{FinalsError, Result};

/// Build the event filter. A parseable `RUST_LOG` value wins over the
/// configured level.
pub fn build_filter(env_directives: Option<&str>, level: &str) -> Result<EnvFilter> {
    if let Some(directives) = env_directives.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return Ok(filter),
            Err(e) => eprintln!("Ignoring RUST_LOG '{}': {}", directives, e),
        }
    }
    EnvFilter::try_new(level)
        .map_err(|e| FinalsError::Config(format!("logging.level '{}': {}", level, e)))
}

/// Install the global subscriber: human-readable lines on stderr, so that
/// `--json` output on stdout stays clean, plus a daily-rotated JSON file when
/// `logging.dir` is set.
///
/// The returned guard flushes the file writer on drop; hold it until exit.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env_directives.as_deref(), &config.level)?;

    let (file_layer, guard) = match config.dir.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| FinalsError::Config(format!("installing log subscriber: {}", e)))?;

    Ok(guard)
}
