//! One reconciliation sweep of the upstream directory.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::merge::{apply_upstream, seed_from_upstream};
use super::DirectoryStore;
use crate::error::{Error, Result};
use crate::models::LocalUser;
use crate::upstream::DirectorySource;
use crate::util::unix_timestamp_millis;

/// Upstream page size used when none is configured
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// Counts produced by a single sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Upstream pages fetched
    pub pages: u64,
    /// Distinct upstream users seen
    pub seen: u64,
    /// New (or revived) local records
    pub inserted: u64,
    /// Existing records that were mutated
    pub updated: u64,
    /// Existing records with nothing to do
    pub unchanged: u64,
    /// Records soft-deleted because they vanished upstream
    pub soft_deleted: u64,
    /// Cancellation stopped the sweep before the enumeration finished
    pub interrupted: bool,
}

/// Reconciles the local directory against the upstream directory.
pub struct Reconciler<S, D> {
    store: S,
    source: D,
    page_size: u32,
}

impl<S: DirectoryStore, D: DirectorySource> Reconciler<S, D> {
    pub const fn new(store: S, source: D) -> Self {
        Self {
            store,
            source,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Run one full sweep.
    ///
    /// Each page is merged and persisted before the next one is requested, so
    /// an upstream failure keeps earlier pages. Soft deletes only happen once
    /// the enumeration has completed; a user on a later page is never treated
    /// as missing. Cancellation is honoured between pages and while waiting
    /// for a page, never in the middle of applying one.
    #[instrument(skip_all, fields(page_size = self.page_size))]
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport> {
        let mut baseline: HashMap<String, LocalUser> = self
            .store
            .load_active()
            .await?
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        info!(baseline = baseline.len(), "Starting directory reconciliation");

        let mut seen: HashSet<String> = HashSet::new();
        let mut used_tokens: HashSet<String> = HashSet::new();
        let mut report = CycleReport::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                page = self.source.list_page(page_token.as_deref(), self.page_size) => Some(page?),
            };
            let Some(page) = page else {
                info!(pages = report.pages, "Reconciliation cancelled; skipping soft deletes");
                report.interrupted = true;
                return Ok(report);
            };
            report.pages += 1;

            let now = unix_timestamp_millis();
            let mut updated = Vec::new();
            let mut inserted = Vec::new();

            for upstream in &page.users {
                if !seen.insert(upstream.id.clone()) {
                    debug!(user_id = %upstream.id, "Upstream user listed twice; ignoring repeat");
                    continue;
                }

                match baseline.get_mut(&upstream.id) {
                    Some(local) => match apply_upstream(local, upstream, now) {
                        Some(update) => updated.push(update),
                        None => report.unchanged += 1,
                    },
                    None => inserted.push(seed_from_upstream(upstream, now)),
                }
            }

            self.store.save_page(&updated, &inserted).await?;
            report.updated += updated.len() as u64;
            report.inserted += inserted.len() as u64;
            report.seen = seen.len() as u64;
            debug!(
                page = report.pages,
                users = page.users.len(),
                updated = updated.len(),
                inserted = inserted.len(),
                "Applied upstream page"
            );
            baseline.extend(inserted.into_iter().map(|user| (user.id.clone(), user)));

            // A token handed out twice means the listing loops back on itself.
            match page.next_page_token {
                Some(next) if !used_tokens.insert(next.clone()) => {
                    return Err(Error::Upstream(format!(
                        "pagination token repeated within one listing: {next}"
                    )));
                }
                Some(next) => page_token = Some(next),
                None => break,
            }

            if cancel.is_cancelled() {
                info!(pages = report.pages, "Reconciliation cancelled; skipping soft deletes");
                report.interrupted = true;
                return Ok(report);
            }
        }

        let mut missing: Vec<String> = baseline
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        missing.sort();
        if !missing.is_empty() {
            report.soft_deleted = self
                .store
                .soft_delete(&missing, unix_timestamp_millis())
                .await?;
        }

        info!(
            pages = report.pages,
            seen = report.seen,
            inserted = report.inserted,
            updated = report.updated,
            unchanged = report.unchanged,
            soft_deleted = report.soft_deleted,
            "Directory reconciliation finished"
        );
        Ok(report)
    }
}
