//! Prober trait abstraction.
//!
//! Defines the single seam between the worker pool and whatever performs
//! a probe, so the pool can be driven by fakes in tests.

use crate::types::ProbeTarget;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal classification of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// 2xx response carrying a non-empty title.
    Success,
    /// No response within the configured timeout.
    Timeout,
    /// Connection could not be established or broke mid-response.
    ConnectionError,
    /// Response with a non-2xx status code.
    HttpError,
    /// 2xx response without an extractable title.
    NoTitle,
}

impl ProbeStatus {
    pub const ALL: [ProbeStatus; 5] = [
        Self::Success,
        Self::Timeout,
        Self::ConnectionError,
        Self::HttpError,
        Self::NoTitle,
    ];

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Timeout => write!(f, "timeout"),
            Self::ConnectionError => write!(f, "connection error"),
            Self::HttpError => write!(f, "http error"),
            Self::NoTitle => write!(f, "no title"),
        }
    }
}

/// Result of probing a single target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// The target that produced this outcome.
    pub target: ProbeTarget,
    /// Classification of the probe.
    pub status: ProbeStatus,
    /// Trimmed page title, present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The URL that was requested.
    pub url: String,
    /// HTTP status code, when a response arrived.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Failure detail for non-success outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Response time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

impl ProbeOutcome {
    /// Create an outcome for `target` with the given status.
    pub fn new(target: ProbeTarget, status: ProbeStatus) -> Self {
        Self {
            url: target.url(),
            target,
            status,
            title: None,
            http_status: None,
            error: None,
            response_time_ms: None,
        }
    }

    /// Successful outcome carrying a title.
    pub fn success(target: ProbeTarget, title: impl Into<String>) -> Self {
        Self::new(target, ProbeStatus::Success).with_title(title)
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the HTTP status code.
    pub fn with_http_status(mut self, code: u16) -> Self {
        self.http_status = Some(code);
        self
    }

    /// Set the failure detail.
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Set the response time.
    pub fn with_response_time(mut self, time_ms: u64) -> Self {
        self.response_time_ms = Some(time_ms);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Something that can probe a target.
///
/// Implementations must absorb every failure into the returned outcome;
/// exactly one outcome is produced per call.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome;
}
