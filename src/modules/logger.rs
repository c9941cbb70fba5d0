use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{AppError, AppResult};
use crate::proxy::config::ProxyConfig;
use crate::proxy::upstream;

pub const UPSTREAM_LOG_PREFIX: &str = "copilot-upstream";
const DEFAULT_STDOUT_FILTER: &str = "info";

/// Keeps the non-blocking file writer flushing; drop it only at shutdown.
pub struct LoggerGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Maps `COPILOT_LOG_LEVEL` to a level filter. `None` disables the upstream log files.
pub fn copilot_level_filter(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "none" => None,
        "error" => Some(LevelFilter::ERROR),
        "warning" | "warn" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "all" | "trace" => Some(LevelFilter::TRACE),
        _ => Some(LevelFilter::DEBUG),
    }
}

/// Installs the global subscriber: JSON to stdout (`RUST_LOG`), plus the upstream
/// client's own events to daily files under `COPILOT_LOG_DIR`.
pub fn init_logger(config: &ProxyConfig) -> AppResult<LoggerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_STDOUT_FILTER));

    let stdout_layer = fmt::layer()
        .json()
        .flatten_event(true)
        .with_target(true)
        .with_filter(env_filter);

    let mut file_error = None;
    let mut file_guard = None;
    let file_layer = match copilot_level_filter(&config.copilot_log_level) {
        Some(level) => match build_file_appender(config) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                file_guard = Some(guard);
                Some(
                    fmt::layer()
                        .json()
                        .flatten_event(true)
                        .with_ansi(false)
                        .with_writer(writer)
                        .with_filter(Targets::new().with_target(upstream::LOG_TARGET, level)),
                )
            }
            Err(e) => {
                file_error = Some(e);
                None
            }
        },
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logger(e.to_string()))?;

    if let Some(e) = file_error {
        warn!(
            "Upstream log files disabled, cannot write to {}: {}",
            config.copilot_log_dir.display(),
            e
        );
    }

    Ok(LoggerGuard {
        _file_guard: file_guard,
    })
}

fn build_file_appender(config: &ProxyConfig) -> AppResult<RollingFileAppender> {
    std::fs::create_dir_all(&config.copilot_log_dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(UPSTREAM_LOG_PREFIX)
        .filename_suffix("log")
        .build(&config.copilot_log_dir)
        .map_err(|e| AppError::Logger(e.to_string()))
}
