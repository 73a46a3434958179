//! Bounded worker pool.
//!
//! Targets are pulled lazily from an iterator and each one is spawned as
//! its own task once a semaphore permit is available, so at most
//! `workers` probes are ever in flight no matter how large the target
//! space is. Finished outcomes are handed to a completion channel.

use super::shutdown::Shutdown;
use super::traits::{ProbeOutcome, ProbeStatus, Prober};
use crate::error::ValidationError;
use crate::types::ProbeTarget;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::instrument::WithSubscriber;
use tracing::{debug, error, info, Instrument};

/// Summary of a dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dispatched {
    /// Number of targets handed to a worker.
    pub submitted: u64,
    /// Whether submission stopped early because of a shutdown request.
    pub interrupted: bool,
}

/// Fan-out of probe targets over a fixed number of workers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Create a pool allowing `workers` concurrent probes.
    pub fn new(workers: usize) -> Result<Self, ValidationError> {
        if workers == 0 {
            return Err(ValidationError::ZeroWorkers);
        }
        Ok(Self { workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Submit every target to `prober`, sending each outcome on `tx`.
    ///
    /// Returns once submission has finished or been cancelled. Probes that
    /// are still running keep their clone of `tx`, so the receiving side
    /// sees the channel close only after the last outcome is delivered.
    /// The receiver must be drained concurrently with this call.
    pub async fn dispatch<P, I>(
        &self,
        prober: Arc<P>,
        targets: I,
        tx: mpsc::Sender<ProbeOutcome>,
        shutdown: &Shutdown,
    ) -> Dispatched
    where
        P: Prober + ?Sized + 'static,
        I: IntoIterator<Item = ProbeTarget>,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut dispatched = Dispatched::default();

        for target in targets {
            if shutdown.is_triggered() {
                dispatched.interrupted = true;
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = shutdown.triggered() => {
                    dispatched.interrupted = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            dispatched.submitted += 1;
            let prober = Arc::clone(&prober);
            let tx = tx.clone();

            tokio::spawn(
                async move {
                    let outcome = probe_isolated(prober.as_ref(), target).await;
                    // The permit is held until the outcome has been handed off.
                    if tx.send(outcome).await.is_err() {
                        debug!(url = %target, "Outcome dropped, aggregator is gone");
                    }
                    drop(permit);
                }
                .in_current_span()
                .with_current_subscriber(),
            );
        }

        if dispatched.interrupted {
            let in_flight = self.workers - semaphore.available_permits();
            info!(
                submitted = dispatched.submitted,
                in_flight, "Submission stopped, waiting for in-flight probes"
            );
        } else {
            debug!(submitted = dispatched.submitted, "All targets submitted");
        }

        dispatched
    }
}

/// Run one probe, turning a panic into a failed outcome.
async fn probe_isolated<P: Prober + ?Sized>(prober: &P, target: ProbeTarget) -> ProbeOutcome {
    match AssertUnwindSafe(prober.probe(&target)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(url = %target, "Probe panicked");
            ProbeOutcome::new(target, ProbeStatus::ConnectionError).with_error("probe panicked")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::aggregator::ResultAggregator;
    use crate::types::{Port, Protocol};
    use async_trait::async_trait;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn targets(n: u32) -> Vec<ProbeTarget> {
        (0..n)
            .map(|i| {
                ProbeTarget::new(
                    Ipv4Addr::from(0x0a00_0000 + i),
                    Protocol::Http,
                    Port::HTTP,
                )
            })
            .collect()
    }

    /// Counts how many probes are executing at once.
    #[derive(Default)]
    struct CountingProber {
        current: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Prober for CountingProber {
        async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            ProbeOutcome::success(*target, "ok")
        }
    }

    /// Fails one address, panics on another, succeeds elsewhere.
    struct FlakyProber {
        fail: Ipv4Addr,
        panic_on: Option<Ipv4Addr>,
    }

    #[async_trait]
    impl Prober for FlakyProber {
        async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
            if Some(target.address) == self.panic_on {
                panic!("boom");
            }
            if target.address == self.fail {
                ProbeOutcome::new(*target, ProbeStatus::ConnectionError).with_error("refused")
            } else {
                ProbeOutcome::success(*target, format!("host {}", target.address))
            }
        }
    }

    /// Requests shutdown from inside the first probe.
    struct CancellingProber {
        shutdown: Shutdown,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Prober for CancellingProber {
        async fn probe(&self, target: &ProbeTarget) -> ProbeOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.shutdown.trigger();
            tokio::time::sleep(Duration::from_millis(5)).await;
            ProbeOutcome::success(*target, "first")
        }
    }

    async fn drive<P: Prober + 'static>(
        pool: &WorkerPool,
        prober: Arc<P>,
        targets: Vec<ProbeTarget>,
        shutdown: &Shutdown,
    ) -> (Dispatched, crate::scanner::aggregator::Aggregate) {
        let (tx, rx) = mpsc::channel(pool.workers());
        let collector = tokio::spawn(ResultAggregator::new(None).collect(rx));
        let dispatched = pool.dispatch(prober, targets, tx, shutdown).await;
        (dispatched, collector.await.unwrap())
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert_eq!(WorkerPool::new(0).unwrap_err(), ValidationError::ZeroWorkers);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_never_exceeds_workers() {
        let pool = WorkerPool::new(3).unwrap();
        let prober = Arc::new(CountingProber::default());

        let (dispatched, aggregate) =
            drive(&pool, Arc::clone(&prober), targets(40), &Shutdown::new()).await;

        assert_eq!(dispatched.submitted, 40);
        assert!(!dispatched.interrupted);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 40);
        assert_eq!(aggregate.stats.total(), 40);
        let peak = prober.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeded 3 workers");
        assert!(peak >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failing_target_is_isolated() {
        let all = targets(8);
        let fail = all[3].address;
        let pool = WorkerPool::new(2).unwrap();
        let prober = Arc::new(FlakyProber {
            fail,
            panic_on: None,
        });

        let (_, aggregate) = drive(&pool, prober, all, &Shutdown::new()).await;

        assert_eq!(aggregate.stats.success, 7);
        assert_eq!(aggregate.stats.connection_error, 1);
        assert_eq!(aggregate.results.len(), 7);
        assert!(aggregate.results.iter().all(|e| e.ip != fail));
        assert!(aggregate
            .results
            .iter()
            .all(|e| e.title == format!("host {}", e.ip)));
    }

    #[tokio::test]
    async fn test_panicking_probe_still_yields_outcome() {
        let all = targets(5);
        let pool = WorkerPool::new(2).unwrap();
        let prober = Arc::new(FlakyProber {
            fail: Ipv4Addr::UNSPECIFIED,
            panic_on: Some(all[0].address),
        });

        let (dispatched, aggregate) = drive(&pool, prober, all, &Shutdown::new()).await;

        assert_eq!(dispatched.submitted, 5);
        assert_eq!(aggregate.stats.total(), 5);
        assert_eq!(aggregate.stats.connection_error, 1);
        assert_eq!(aggregate.results.len(), 4);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_submits_nothing() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let pool = WorkerPool::new(4).unwrap();
        let prober = Arc::new(CountingProber::default());

        let (dispatched, aggregate) =
            drive(&pool, Arc::clone(&prober), targets(10), &shutdown).await;

        assert!(dispatched.interrupted);
        assert_eq!(dispatched.submitted, 0);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
        assert_eq!(aggregate.stats.total(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_mid_run_keeps_completed_outcomes() {
        let shutdown = Shutdown::new();
        let pool = WorkerPool::new(1).unwrap();
        let prober = Arc::new(CancellingProber {
            shutdown: shutdown.clone(),
            calls: AtomicUsize::new(0),
        });

        let (dispatched, aggregate) =
            drive(&pool, Arc::clone(&prober), targets(10), &shutdown).await;

        assert!(dispatched.interrupted);
        assert_eq!(dispatched.submitted, 1);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 1);
        // The in-flight probe was allowed to finish and was collected.
        assert_eq!(aggregate.results.len(), 1);
        assert_eq!(aggregate.results.entries()[0].title, "first");
    }
}
