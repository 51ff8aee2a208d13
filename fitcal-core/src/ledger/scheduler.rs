//! Periodic rollover checks while the ledger is open.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{LedgerHandle, RolloverOutcome};

/// Background task that runs the rollover check on a fixed period.
///
/// Stop it with [`RolloverScheduler::shutdown`]; dropping it aborts the task.
pub struct RolloverScheduler {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RolloverScheduler {
    /// Spawns the task on the current tokio runtime.
    ///
    /// The first check happens one `period` from now; opening the ledger has
    /// already run one.
    pub fn spawn(ledger: LedgerHandle, period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        match ledger.check_rollover() {
                            RolloverOutcome::Unchanged => {}
                            outcome => tracing::debug!("Scheduled rollover check: {:?}", outcome),
                        }
                    }
                }
            }

            tracing::debug!("Rollover scheduler stopped");
        });

        tracing::debug!("Rollover scheduler started, period {:?}", period);
        Self {
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stops the task and waits for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    tracing::warn!("Rollover scheduler ended abnormally: {}", e);
                }
            }
        }
    }
}

impl Drop for RolloverScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
