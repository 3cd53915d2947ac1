//! Periodic automatic scans.
//!
//! At most one scan is in flight: a tick that finds a scan already running
//! (scheduled or requested by a caller) is skipped, not queued.

use super::{BackupService, Trigger};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct Scheduler {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Start scanning every `period`. A zero period leaves the scheduler idle.
    ///
    /// The loop also stops when `shutdown` is cancelled.
    pub fn start(
        service: Arc<BackupService>,
        period: Duration,
        shutdown: &CancellationToken,
    ) -> Self {
        let cancel = shutdown.child_token();
        if period.is_zero() {
            info!("Scan interval is 0, automatic scans disabled");
            return Self { cancel, handle: None };
        }

        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(period_secs = period.as_secs_f64(), "Automatic scans started");

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => run_tick(service.clone()).await,
                }
            }
            info!("Automatic scans stopped");
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop the loop and wait for an in-flight scan to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Scheduler task panicked");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_tick(service: Arc<BackupService>) {
    match tokio::task::spawn_blocking(move || service.try_scan(Trigger::Automatic)).await {
        Ok(Ok(Some(result))) if result.created => {
            debug!(id = ?result.entry.map(|e| e.id), "Automatic scan created a backup");
        }
        Ok(Ok(Some(result))) => {
            debug!(reason = ?result.reason, "Automatic scan skipped");
        }
        Ok(Ok(None)) => debug!("Scan already in progress, skipping tick"),
        Ok(Err(e)) => warn!(error = %e, "Automatic scan failed"),
        Err(e) => error!(error = %e, "Automatic scan task panicked"),
    }
}
