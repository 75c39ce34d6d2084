//! Shared, observable state of the background sync loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use super::cycle::CycleReport;
use crate::util::unix_timestamp_millis;

/// Counters and last-outcome details published by the scheduler.
///
/// The failure counter is cumulative and is never reset by a later success.
#[derive(Clone, Default)]
pub struct SyncStatus {
    counters: Arc<Counters>,
    last: Arc<Mutex<LastOutcome>>,
}

#[derive(Default)]
struct Counters {
    cycles_started: AtomicU64,
    cycles_succeeded: AtomicU64,
    cycles_failed: AtomicU64,
}

#[derive(Default)]
struct LastOutcome {
    success_at: Option<i64>,
    failure_at: Option<i64>,
    error: Option<String>,
    report: Option<CycleReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatusSnapshot {
    pub cycles_started: u64,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
    pub last_success_at: Option<i64>,
    pub last_failure_at: Option<i64>,
    pub last_error: Option<String>,
    pub last_report: Option<CycleReport>,
}

impl SyncStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn cycle_started(&self) {
        self.counters.cycles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) async fn record_success(&self, report: CycleReport) {
        self.counters.cycles_succeeded.fetch_add(1, Ordering::Relaxed);
        let mut last = self.last.lock().await;
        last.success_at = Some(unix_timestamp_millis());
        last.report = Some(report);
    }

    /// Returns the cumulative failure count including this one.
    pub(crate) async fn record_failure(&self, error: String) -> u64 {
        let failures = self.counters.cycles_failed.fetch_add(1, Ordering::Relaxed) + 1;
        let mut last = self.last.lock().await;
        last.failure_at = Some(unix_timestamp_millis());
        last.error = Some(error);
        failures
    }

    /// Cumulative number of failed cycles
    pub fn failure_count(&self) -> u64 {
        self.counters.cycles_failed.load(Ordering::Relaxed)
    }

    pub async fn snapshot(&self) -> SyncStatusSnapshot {
        let last = self.last.lock().await;
        SyncStatusSnapshot {
            cycles_started: self.counters.cycles_started.load(Ordering::Relaxed),
            cycles_succeeded: self.counters.cycles_succeeded.load(Ordering::Relaxed),
            cycles_failed: self.counters.cycles_failed.load(Ordering::Relaxed),
            last_success_at: last.success_at,
            last_failure_at: last.failure_at,
            last_error: last.error.clone(),
            last_report: last.report.clone(),
        }
    }
}
