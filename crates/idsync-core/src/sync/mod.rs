//! Directory reconciliation engine.
//!
//! [`Reconciler`] performs one sweep of the upstream directory against the
//! local store; [`SyncScheduler`] runs sweeps forever on a fixed interval
//! until cancelled.

mod cycle;
pub mod merge;
mod scheduler;
mod status;
#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;

use crate::error::Result;
use crate::models::{LocalUser, UserUpdate};

pub use cycle::{CycleReport, Reconciler, DEFAULT_PAGE_SIZE};
pub use scheduler::SyncScheduler;
pub use status::{SyncStatus, SyncStatusSnapshot};

/// Local directory storage as seen by the reconciliation cycle.
pub trait DirectoryStore: Send + Sync {
    /// All records that are not soft-deleted
    fn load_active(&self) -> impl Future<Output = Result<Vec<LocalUser>>> + Send;

    /// Persist one page of mutated and newly seen records in one transaction
    fn save_page(
        &self,
        updated: &[UserUpdate],
        inserted: &[LocalUser],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Soft delete records that vanished upstream; returns rows affected
    fn soft_delete(&self, ids: &[String], at: i64) -> impl Future<Output = Result<u64>> + Send;
}
