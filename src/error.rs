//! Error types for titlescan.
//!
//! Uses `thiserror` for ergonomic error definitions. Per-target probe
//! failures are carried as [`ProbeStatus`](crate::scanner::ProbeStatus)
//! values, not errors.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

/// Input rejected before any probe is scheduled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("malformed IPv4 address: '{0}'")]
    MalformedAddress(String),

    #[error("start address {start} is greater than end address {end}")]
    RangeInverted { start: Ipv4Addr, end: Ipv4Addr },

    #[error("invalid port specification: {0}")]
    InvalidPort(String),

    #[error("no ports specified")]
    NoPorts,

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("timeout must be at least 1 second")]
    ZeroTimeout,
}

/// Scan-level infrastructure failures.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("result aggregator failed: {0}")]
    Aggregator(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Failure to persist or read back a result set.
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("failed to write results to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("failed to read results from {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },
}

/// Configuration loading and saving errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure to set up the run's log sinks.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for output operations.
pub type OutputResult<T> = Result<T, OutputError>;
