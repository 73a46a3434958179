//! Scanner module - coordinates a title scan over an address range.
//!
//! Targets flow from the range enumerator through the protocol policy into
//! the [`WorkerPool`], which fans them out over a bounded number of probe
//! tasks. Outcomes fan back in through a channel to the single
//! [`ResultAggregator`].

pub mod aggregator;
pub mod http;
pub mod pool;
pub mod shutdown;
pub mod traits;

use crate::error::{ScanError, ScanResult};
use crate::types::{IpRange, PortList, ProbeTarget, ProtocolPolicy, ScanId};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::instrument::WithSubscriber;
use tracing::{info, info_span, warn, Instrument};

pub use aggregator::{Aggregate, ResultAggregator, ResultEntry, ResultSet, ScanStats};
pub use http::{HttpProber, HttpResponse, HttpSettings, HttpTransport, ReqwestTransport, TransportError};
pub use pool::{Dispatched, WorkerPool};
pub use shutdown::Shutdown;
pub use traits::{ProbeOutcome, ProbeStatus, Prober};

/// What to scan: an address range, the ports, and the protocol policy.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub range: IpRange,
    pub ports: PortList,
    pub policy: ProtocolPolicy,
}

impl ScanPlan {
    pub fn new(range: IpRange, ports: PortList, policy: ProtocolPolicy) -> Self {
        Self {
            range,
            ports,
            policy,
        }
    }

    /// Total number of probe targets the plan expands to.
    pub fn total_targets(&self) -> u64 {
        self.range
            .len()
            .saturating_mul(self.policy.targets_per_address(&self.ports))
    }

    /// Lazily generate every target, address by address.
    pub fn targets(&self) -> impl Iterator<Item = ProbeTarget> + Send + 'static {
        let ports = self.ports.clone();
        let policy = self.policy;
        self.range
            .iter()
            .flat_map(move |address| policy.targets(address, &ports))
    }
}

/// Settings for one scan run.
#[derive(Debug, Clone)]
pub struct ScanJobConfig {
    /// Maximum number of probes in flight.
    pub workers: usize,
    /// Show a progress bar.
    pub progress: bool,
}

impl ScanJobConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            progress: false,
        }
    }

    /// Enable the progress bar.
    pub fn with_progress(mut self) -> Self {
        self.progress = true;
        self
    }
}

/// Complete scan results.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub id: ScanId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Targets handed to a worker.
    pub targets_submitted: u64,
    /// Targets the plan expanded to.
    pub targets_planned: u64,
    pub stats: ScanStats,
    pub results: ResultSet,
    /// Submission was stopped by a shutdown request.
    pub interrupted: bool,
}

/// Execute a complete scan of `plan` with `prober`.
///
/// Only returns an error for infrastructure failures; every per-target
/// failure is counted in [`ScanReport::stats`].
pub async fn run_scan<P>(
    prober: Arc<P>,
    plan: &ScanPlan,
    config: &ScanJobConfig,
    shutdown: &Shutdown,
) -> ScanResult<ScanReport>
where
    P: Prober + ?Sized + 'static,
{
    let id = ScanId::new();
    let span = info_span!("scan", id = %id.short());

    async move {
        let pool = WorkerPool::new(config.workers)?;
        let planned = plan.total_targets();
        let started_at = Utc::now();
        let clock = Instant::now();

        info!(
            range = %plan.range,
            ports = %plan.ports,
            policy = %plan.policy,
            targets = planned,
            workers = pool.workers(),
            "Starting scan of {} ({} targets)", plan.range, planned
        );

        let progress = config.progress.then(|| progress_bar(planned));

        let (tx, rx) = mpsc::channel(pool.workers());
        let collector = tokio::spawn(
            ResultAggregator::new(progress.clone())
                .collect(rx)
                .in_current_span()
                .with_current_subscriber(),
        );

        let dispatched = pool.dispatch(prober, plan.targets(), tx, shutdown).await;

        let aggregate = collector
            .await
            .map_err(|e| ScanError::Aggregator(e.to_string()))?;

        // A shutdown after the last submission still marks the run interrupted.
        let interrupted = dispatched.interrupted || shutdown.is_triggered();

        if let Some(pb) = progress {
            if interrupted {
                pb.abandon_with_message("Scan interrupted");
            } else {
                pb.finish_with_message("Scan complete");
            }
        }

        let duration_ms = clock.elapsed().as_millis() as u64;
        if interrupted {
            warn!(
                submitted = dispatched.submitted,
                planned, "Scan interrupted after {} of {} targets", dispatched.submitted, planned
            );
        }
        info!(
            found = aggregate.results.len(),
            outcomes = aggregate.stats.total(),
            duration_ms,
            "Scan finished"
        );

        Ok(ScanReport {
            id,
            started_at,
            completed_at: Utc::now(),
            duration_ms,
            targets_submitted: dispatched.submitted,
            targets_planned: planned,
            stats: aggregate.stats,
            results: aggregate.results,
            interrupted,
        })
    }
    .instrument(span)
    .await
}

fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Protocol;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct EchoProber;

    #[async_trait]
    impl Prober for EchoProber {
        async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
            match target.protocol {
                Protocol::Http => ProbeOutcome::success(*target, target.address.to_string()),
                Protocol::Https => ProbeOutcome::new(*target, ProbeStatus::NoTitle),
            }
        }
    }

    fn plan(start: &str, end: &str, ports: &[u16]) -> ScanPlan {
        ScanPlan::new(
            IpRange::parse(start, end).unwrap(),
            PortList::from_raw(ports).unwrap(),
            ProtocolPolicy::Mirror443,
        )
    }

    #[test]
    fn test_plan_expands_lazily_and_completely() {
        let plan = plan("10.0.0.1", "10.0.0.4", &[80, 443]);
        assert_eq!(plan.total_targets(), 12);

        let targets: Vec<_> = plan.targets().collect();
        assert_eq!(targets.len(), 12);
        assert_eq!(targets[0].address, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(targets[11].address, Ipv4Addr::new(10, 0, 0, 4));
    }

    #[test]
    fn test_plan_total_for_full_space_does_not_overflow() {
        let plan = plan("0.0.0.0", "255.255.255.255", &[80, 443]);
        assert_eq!(plan.total_targets(), 3 * (1u64 << 32));
    }

    #[tokio::test]
    async fn test_run_scan_reports_every_target() {
        let plan = plan("10.0.0.1", "10.0.0.3", &[80, 443]);
        let report = run_scan(
            Arc::new(EchoProber),
            &plan,
            &ScanJobConfig::new(2),
            &Shutdown::new(),
        )
        .await
        .unwrap();

        assert!(!report.interrupted);
        assert_eq!(report.targets_planned, 9);
        assert_eq!(report.targets_submitted, 9);
        assert_eq!(report.stats.total(), 9);
        assert_eq!(report.stats.success, 6);
        assert_eq!(report.stats.no_title, 3);
        assert_eq!(report.results.len(), 6);
        assert!(report.results.iter().all(|e| e.title == e.ip.to_string()));
    }

    #[tokio::test]
    async fn test_run_scan_rejects_zero_workers() {
        let plan = plan("10.0.0.1", "10.0.0.1", &[80]);
        let err = run_scan(
            Arc::new(EchoProber),
            &plan,
            &ScanJobConfig::new(0),
            &Shutdown::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            ScanError::Validation(crate::error::ValidationError::ZeroWorkers)
        ));
    }

    /// Requests shutdown from inside the last probe of the run.
    struct LastProbeCancels {
        shutdown: Shutdown,
        remaining: AtomicUsize,
    }

    #[async_trait]
    impl Prober for LastProbeCancels {
        async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                self.shutdown.trigger();
            }
            ProbeOutcome::success(*target, "up")
        }
    }

    #[tokio::test]
    async fn test_shutdown_after_submission_marks_report_interrupted() {
        let plan = plan("10.0.0.1", "10.0.0.5", &[80]);
        let shutdown = Shutdown::new();
        let prober = Arc::new(LastProbeCancels {
            shutdown: shutdown.clone(),
            remaining: AtomicUsize::new(5),
        });

        let report = run_scan(prober, &plan, &ScanJobConfig::new(10), &shutdown)
            .await
            .unwrap();

        // Every target was already submitted when the shutdown arrived.
        assert_eq!(report.targets_submitted, 5);
        assert_eq!(report.stats.total(), 5);
        assert_eq!(report.results.len(), 5);
        assert!(report.interrupted);
    }
}
