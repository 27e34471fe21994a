//! Expiry sweeper — reclaims rows whose TTL has run out.
//!
//! Discovery and counting filter on expiry themselves, so the sweeper only
//! frees storage. A cycle that fails is logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use rendezvous_core::Clock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::store::SharedTable;

/// Handle to the background sweep task.
pub(crate) struct Sweeper {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl Sweeper {
    pub(crate) fn spawn(table: SharedTable, clock: Arc<dyn Clock>, every: Duration) -> Self {
        let (shutdown, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(sweep_loop(table, clock, every, shutdown_rx));
        Self { shutdown, task }
    }

    /// Stop the loop. A sweep already running finishes first.
    pub(crate) async fn stop(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "sweeper task failed");
        }
    }
}

/// Delete expired rows every `every`, until shutdown is signalled or the
/// sending half is dropped.
async fn sweep_loop(
    table: SharedTable,
    clock: Arc<dyn Clock>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    // tokio panics on a zero period.
    let mut interval = tokio::time::interval(every.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::debug!(interval_secs = every.as_secs(), "expiry sweeper starting");

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            _ = interval.tick() => {}
        }

        let guard = table.lock().await;
        let Some(rows) = guard.as_ref() else {
            break;
        };
        match rows.sweep_expired(clock.now_secs()) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "expired registrations swept"),
            Err(e) => tracing::warn!(error = %e, "expiry sweep failed"),
        }
    }

    tracing::debug!("expiry sweeper stopped");
}
