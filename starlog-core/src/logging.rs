//! Logging for starlog
//!
//! Log lines go to `$XDG_STATE_HOME/starlog/starlog.log.<date>`, one file
//! per day, keeping at most `[logging] max_files` of them. Stdout belongs to
//! command output and is never logged to.
//!
//! Session lifecycle events are recorded inside a [`session_span`], so every
//! line about one session carries its `session_id` (and `task_id` when the
//! session is attached to a task).

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::Span;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const LOG_FILE_PREFIX: &str = "starlog.log";

/// Install the file subscriber.
///
/// `RUST_LOG` wins over the configured level. Initializing twice in one
/// process keeps the first subscriber.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("failed to create log file: {}", e)))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // span context (session_id, task_id) is printed ahead of each message
    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        max_files = config.max_files,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Span grouping the log lines of one session.
pub fn session_span(session_id: &str, task_id: Option<&str>) -> Span {
    tracing::info_span!("session", session_id, task_id)
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Keeps the background writer alive; dropping it flushes pending lines.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Path prefix of the log files (the appender adds a date suffix)
pub fn log_file_path() -> PathBuf {
    Config::log_path()
}
