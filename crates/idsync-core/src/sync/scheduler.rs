//! Fixed-interval driver for the reconciliation cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{DirectoryStore, Reconciler, SyncStatus};
use crate::upstream::DirectorySource;

/// Runs [`Reconciler::run_cycle`] forever with a fixed pause between cycles.
///
/// A failed cycle is logged and counted and the loop carries on after the
/// normal delay; only cancellation stops it.
pub struct SyncScheduler<S, D> {
    reconciler: Arc<Reconciler<S, D>>,
    interval: Duration,
    status: SyncStatus,
}

impl<S, D> SyncScheduler<S, D>
where
    S: DirectoryStore + 'static,
    D: DirectorySource + 'static,
{
    pub fn new(reconciler: Reconciler<S, D>, interval: Duration) -> Self {
        Self {
            reconciler: Arc::new(reconciler),
            interval,
            status: SyncStatus::new(),
        }
    }

    /// Publish progress into an existing status handle.
    #[must_use]
    pub fn with_status(mut self, status: SyncStatus) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> SyncStatus {
        self.status.clone()
    }

    /// Launch the loop as a detached background task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Drive cycles until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Directory sync scheduler started"
        );

        while !cancel.is_cancelled() {
            self.run_once(&cancel).await;

            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Directory sync scheduler stopped");
    }

    async fn run_once(&self, cancel: &CancellationToken) {
        self.status.cycle_started();

        // A separate task keeps a panicking cycle from taking the loop down.
        let reconciler = Arc::clone(&self.reconciler);
        let cycle_cancel = cancel.clone();
        let outcome =
            tokio::spawn(async move { reconciler.run_cycle(&cycle_cancel).await }).await;

        let error = match outcome {
            Ok(Ok(report)) => {
                if !report.interrupted {
                    self.status.record_success(report).await;
                }
                return;
            }
            Ok(Err(error)) => error.to_string(),
            Err(join_error) => format!("reconciliation task aborted: {join_error}"),
        };

        let failures = self.status.record_failure(error.clone()).await;
        tracing::error!(
            error = %error,
            failures,
            "Directory reconciliation failed; retrying after {:?}",
            self.interval
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::DirectoryService;
    use crate::sync::testing::{upstream, ScriptedSource};

    async fn scheduler(
        source: Arc<ScriptedSource>,
        interval: Duration,
    ) -> (
        SyncScheduler<DirectoryService, Arc<ScriptedSource>>,
        DirectoryService,
    ) {
        let service = DirectoryService::open_in_memory().await.unwrap();
        let reconciler = Reconciler::new(service.clone(), source);
        (SyncScheduler::new(reconciler, interval), service)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn loop_survives_failures_and_counts_them() {
        let source = Arc::new(ScriptedSource::new(vec![
            vec![upstream("u1", "Alice", false)],
            vec![upstream("u2", "Bob", false)],
        ]));
        source.fail_on_page(Some(1));
        let (scheduler, service) = scheduler(source.clone(), Duration::from_millis(10)).await;
        let status = scheduler.status();
        let cancel = CancellationToken::new();
        let handle = scheduler.spawn(cancel.clone());

        tokio::time::timeout(Duration::from_secs(5), async {
            while status.failure_count() < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("scheduler should keep retrying");

        // Page 1 from the failed cycles was persisted
        assert!(service.get_user("u1").await.unwrap().is_some());

        source.fail_on_page(None);
        tokio::time::timeout(Duration::from_secs(5), async {
            while service.get_user("u2").await.unwrap().is_none() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("scheduler should recover once the source does");

        cancel.cancel();
        handle.await.unwrap();

        let snapshot = status.snapshot().await;
        assert!(snapshot.cycles_failed >= 2);
        assert!(snapshot.cycles_succeeded >= 1);
        assert!(snapshot.last_error.is_some());
        assert!(snapshot.last_report.is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancellation_during_sleep_stops_loop() {
        let source = Arc::new(ScriptedSource::new(vec![vec![upstream("u1", "Alice", false)]]));
        let (scheduler, service) = scheduler(source.clone(), Duration::from_secs(3_600)).await;
        let status = scheduler.status();
        let cancel = CancellationToken::new();
        let handle = scheduler.spawn(cancel.clone());

        tokio::time::timeout(Duration::from_secs(5), async {
            while status.snapshot().await.cycles_succeeded == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("first cycle should run immediately");

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop should stop promptly")
            .unwrap();

        assert_eq!(source.requests(), 1);
        assert!(service.get_user("u1").await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancelled_before_start_runs_no_cycle() {
        let source = Arc::new(ScriptedSource::new(vec![vec![upstream("u1", "Alice", false)]]));
        let (scheduler, _) = scheduler(source.clone(), Duration::from_millis(10)).await;
        let status = scheduler.status();
        let cancel = CancellationToken::new();
        cancel.cancel();

        scheduler.run(cancel).await;

        assert_eq!(source.requests(), 0);
        assert_eq!(status.snapshot().await.cycles_started, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shared_status_handle_receives_updates() {
        let source = Arc::new(ScriptedSource::new(vec![vec![upstream("u1", "Alice", false)]]));
        let (scheduler, _) = scheduler(source, Duration::from_secs(3_600)).await;
        let shared = SyncStatus::new();
        let scheduler = scheduler.with_status(shared.clone());
        let cancel = CancellationToken::new();
        let handle = scheduler.spawn(cancel.clone());

        tokio::time::timeout(Duration::from_secs(5), async {
            while shared.snapshot().await.cycles_succeeded == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("cycle should publish into the shared handle");

        cancel.cancel();
        handle.await.unwrap();
        let report = shared.snapshot().await.last_report.unwrap();
        assert_eq!(report.inserted, 1);
    }
}
