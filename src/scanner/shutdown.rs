//! Cancellation for a running scan.
//!
//! A [`Shutdown`] stops the worker pool from submitting new targets.
//! Probes already in flight are left to finish or hit their own timeout.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing::instrument::WithSubscriber;

/// Cloneable cancellation handle shared by the pool and the signal listener.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request cancellation. Idempotent.
    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            info!("Shutdown requested, no further targets will be submitted");
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once cancellation has been requested.
    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }

    /// Trigger on the first Ctrl+C delivered to the process.
    pub fn listen_for_ctrl_c(&self) {
        let shutdown = self.clone();
        tokio::spawn(
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Received interrupt signal");
                    shutdown.trigger();
                }
            }
            .with_current_subscriber(),
        );
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
