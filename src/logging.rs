//! Run-scoped logging.
//!
//! [`ScanLogger`] owns a `tracing` dispatcher with two sinks: an
//! append-only, timestamped log file and an optional stderr mirror. It is
//! not installed globally; callers run the scan inside it (see
//! [`tracing::instrument::WithSubscriber`]) so its lifetime is the run's.

use crate::error::LoggingError;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory receiving the log file.
    pub dir: PathBuf,
    /// Log probe failures (debug level) too.
    pub verbose: bool,
    /// Mirror log lines to stderr.
    pub console: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            verbose: false,
            console: true,
        }
    }
}

/// Local wall-clock timestamps, millisecond precision.
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)))
}

/// Log file name for a run started now, `scan_YYYYmmdd_HHMMSS.log`.
pub fn log_file_name() -> String {
    format!("scan_{}.log", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Logging handle for one scan run.
#[derive(Debug, Clone)]
pub struct ScanLogger {
    dispatch: Dispatch,
    path: PathBuf,
}

impl ScanLogger {
    /// Open the log file and build the sinks.
    pub fn open(config: &LogConfig) -> Result<Self, LoggingError> {
        let path = config.dir.join(log_file_name());
        let open_failed = |e: std::io::Error| LoggingError::OpenFailed {
            path: path.clone(),
            reason: e.to_string(),
        };

        fs::create_dir_all(&config.dir).map_err(open_failed)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(open_failed)?;

        let file_layer = fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .with_timer(LocalTime)
            .with_filter(env_filter(config.verbose));

        let console_layer = config.console.then(|| {
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_timer(LocalTime)
                .with_filter(env_filter(config.verbose))
        });

        let subscriber = tracing_subscriber::registry()
            .with(file_layer)
            .with(console_layer);

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            path,
        })
    }

    /// The dispatcher to run scan work under.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
