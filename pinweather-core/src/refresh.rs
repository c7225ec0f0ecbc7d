//! Background auto-refresh on a fixed interval.

use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::dashboard::{Dashboard, RefreshSummary};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

const SUMMARY_BUFFER: usize = 8;

/// Handle to a running auto-refresh task.
#[derive(Debug)]
pub struct AutoRefresh {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    summaries: mpsc::Receiver<RefreshSummary>,
}

impl AutoRefresh {
    /// Wait for the next completed refresh. `None` once the task has stopped.
    pub async fn next_summary(&mut self) -> Option<RefreshSummary> {
        self.summaries.recv().await
    }

    /// Stop the task and wait for it to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "auto-refresh task panicked");
        }
    }
}

/// Refresh the selection and all pins every `period` until `cancel` fires.
///
/// The first refresh happens one full period after spawning. The dashboard
/// lock is only held to capture the plan and to commit the outcome.
pub fn spawn_auto_refresh(
    dashboard: Arc<Mutex<Dashboard>>,
    period: Duration,
    cancel: CancellationToken,
) -> AutoRefresh {
    let (tx, rx) = mpsc::channel(SUMMARY_BUFFER);
    let token = cancel.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = time::interval_at(time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let plan = dashboard.lock().refresh_plan();
            if plan.is_empty() {
                tracing::debug!("nothing to refresh");
                continue;
            }

            let outcome = tokio::select! {
                _ = token.cancelled() => break,
                outcome = plan.run() => outcome,
            };
            let summary = dashboard.lock().apply_refresh(outcome);
            tracing::info!(
                refreshed = summary.refreshed,
                failed = summary.failed.len(),
                "auto-refresh complete"
            );

            if tx.try_send(summary).is_err() {
                tracing::debug!("refresh summary dropped; receiver is behind or gone");
            }
        }
        tracing::debug!("auto-refresh stopped");
    });

    AutoRefresh { cancel, handle, summaries: rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        provider::fake::{FakeProvider, location},
        store::MemoryStore,
    };

    fn shared(provider: &Arc<FakeProvider>) -> Arc<Mutex<Dashboard>> {
        let dash = Dashboard::load(provider.clone(), Arc::new(MemoryStore::new()));
        Arc::new(Mutex::new(dash))
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_once_per_period() {
        let provider = Arc::new(FakeProvider::new());
        let dashboard = shared(&provider);
        dashboard.lock().pin(location("Oslo", "Norway")).expect("pin");
        dashboard.lock().pin(location("Rome", "Italy")).expect("pin");

        let mut auto = spawn_auto_refresh(dashboard.clone(), DEFAULT_REFRESH_INTERVAL, CancellationToken::new());

        tokio::time::sleep(Duration::from_secs(9 * 60)).await;
        assert_eq!(provider.forecast_count(), 0);

        let first = auto.next_summary().await.expect("first refresh");
        assert_eq!(first.refreshed, 2);
        assert_eq!(provider.forecast_count(), 2);
        assert!(dashboard.lock().snapshot("Oslo, Norway").is_some());

        let second = auto.next_summary().await.expect("second refresh");
        assert_eq!(second.refreshed, 2);
        assert_eq!(provider.forecast_count(), 4);

        auto.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_block_others() {
        let provider = Arc::new(FakeProvider::new());
        let dashboard = shared(&provider);
        dashboard.lock().pin(location("Oslo", "Norway")).expect("pin");
        dashboard.lock().pin(location("Rome", "Italy")).expect("pin");
        provider.fail("Oslo, Norway");

        let mut auto = spawn_auto_refresh(dashboard.clone(), Duration::from_secs(60), CancellationToken::new());
        let summary = auto.next_summary().await.expect("refresh");

        assert_eq!(summary.refreshed, 1);
        assert_eq!(summary.failed, ["Oslo, Norway"]);
        assert!(dashboard.lock().snapshot("Rome, Italy").is_some());

        provider.recover("Oslo, Norway");
        let summary = auto.next_summary().await.expect("refresh");
        assert!(summary.failed.is_empty());
        assert!(dashboard.lock().snapshot("Oslo, Norway").is_some());

        auto.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop() {
        let provider = Arc::new(FakeProvider::new());
        let dashboard = shared(&provider);
        dashboard.lock().pin(location("Oslo", "Norway")).expect("pin");

        let cancel = CancellationToken::new();
        let mut auto = spawn_auto_refresh(dashboard, Duration::from_secs(60), cancel.clone());

        cancel.cancel();
        assert!(auto.next_summary().await.is_none());
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(provider.forecast_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_dashboard_skips_fetching() {
        let provider = Arc::new(FakeProvider::new());
        let dashboard = shared(&provider);

        let auto = spawn_auto_refresh(dashboard, Duration::from_secs(60), CancellationToken::new());
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(provider.forecast_count(), 0);
        auto.stop().await;
    }
}
