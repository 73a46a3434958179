//! Result aggregation.
//!
//! The aggregator is the only consumer of the completion channel, which
//! makes it the single writer of the [`ResultSet`].

use super::traits::{ProbeOutcome, ProbeStatus};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use tokio::sync::mpsc;

/// One successful probe: `(ip, url, title)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    #[serde(rename = "IP")]
    pub ip: Ipv4Addr,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Title")]
    pub title: String,
}

impl ResultEntry {
    pub fn new(ip: Ipv4Addr, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            ip,
            url: url.into(),
            title: title.into(),
        }
    }
}

/// Successful probes in the order the aggregator received them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    entries: Vec<ResultEntry>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. No deduplication is performed.
    pub fn push(&mut self, entry: ResultEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultEntry> {
        self.entries.iter()
    }
}

impl FromIterator<ResultEntry> for ResultSet {
    fn from_iter<I: IntoIterator<Item = ResultEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ResultEntry;
    type IntoIter = std::slice::Iter<'a, ResultEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Outcome counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub success: u64,
    pub timeout: u64,
    pub connection_error: u64,
    pub http_error: u64,
    pub no_title: u64,
}

impl ScanStats {
    pub fn record(&mut self, status: ProbeStatus) {
        match status {
            ProbeStatus::Success => self.success += 1,
            ProbeStatus::Timeout => self.timeout += 1,
            ProbeStatus::ConnectionError => self.connection_error += 1,
            ProbeStatus::HttpError => self.http_error += 1,
            ProbeStatus::NoTitle => self.no_title += 1,
        }
    }

    pub fn count(&self, status: ProbeStatus) -> u64 {
        match status {
            ProbeStatus::Success => self.success,
            ProbeStatus::Timeout => self.timeout,
            ProbeStatus::ConnectionError => self.connection_error,
            ProbeStatus::HttpError => self.http_error,
            ProbeStatus::NoTitle => self.no_title,
        }
    }

    /// Total number of outcomes recorded.
    pub fn total(&self) -> u64 {
        ProbeStatus::ALL.iter().map(|&s| self.count(s)).sum()
    }

    /// Outcomes that were not a success.
    pub fn failures(&self) -> u64 {
        self.total() - self.success
    }
}

/// What the aggregator hands back once the channel closes.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    pub results: ResultSet,
    pub stats: ScanStats,
}

/// Single consumer of probe outcomes.
pub struct ResultAggregator {
    aggregate: Aggregate,
    progress: Option<ProgressBar>,
}

impl ResultAggregator {
    pub fn new(progress: Option<ProgressBar>) -> Self {
        Self {
            aggregate: Aggregate::default(),
            progress,
        }
    }

    /// Fold one outcome into the aggregate.
    pub fn accept(&mut self, outcome: ProbeOutcome) {
        self.aggregate.stats.record(outcome.status);

        if let Some(ref pb) = self.progress {
            pb.inc(1);
        }

        if outcome.status != ProbeStatus::Success {
            return;
        }
        let Some(title) = outcome.title else {
            return;
        };

        if let Some(ref pb) = self.progress {
            pb.set_message(format!("{}: {}", outcome.url, title));
        }
        self.aggregate
            .results
            .push(ResultEntry::new(outcome.target.address, outcome.url, title));
    }

    /// Drain `rx` until every sender is dropped.
    pub async fn collect(mut self, mut rx: mpsc::Receiver<ProbeOutcome>) -> Aggregate {
        while let Some(outcome) = rx.recv().await {
            self.accept(outcome);
        }
        self.aggregate
    }

    /// Collect an already materialised sequence of outcomes.
    pub fn collect_all<I: IntoIterator<Item = ProbeOutcome>>(mut self, outcomes: I) -> Aggregate {
        for outcome in outcomes {
            self.accept(outcome);
        }
        self.aggregate
    }
}
