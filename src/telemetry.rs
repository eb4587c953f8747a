//! Tracing subscriber setup for the collector binary.
//!
//! Console output honours `RUST_LOG` and `LOG_FORMAT=json`. When `LOG_DIR` is
//! set, a plain-text copy of every event also goes to
//! `{LOG_DIR}/data_collection_{unix_seconds}.log`.

use std::env;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const ENV_LOG_DIR: &str = "LOG_DIR";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

/// Name of the log file for a run started at `started_at` (unix seconds).
pub fn log_file_name(started_at: i64) -> String {
    format!("data_collection_{started_at}.log")
}

/// Install the global subscriber. Keep the returned guard alive for the
/// whole run so buffered file output is flushed on exit.
pub fn init() -> anyhow::Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    let json = env::var(ENV_LOG_FORMAT).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match env::var(ENV_LOG_DIR).ok().filter(|d| !d.is_empty()) {
        Some(dir) => {
            let log_dir = PathBuf::from(dir);
            std::fs::create_dir_all(&log_dir)?;
            let appender = RollingFileAppender::new(
                Rotation::NEVER,
                log_dir,
                log_file_name(chrono::Utc::now().timestamp()),
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console.with_filter(filter()))
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
