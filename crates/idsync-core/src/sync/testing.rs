//! Scripted collaborators for reconciliation tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

use super::DirectoryStore;
use crate::error::{Error, Result};
use crate::models::{LocalUser, UpstreamPage, UpstreamUser, UserUpdate};
use crate::services::DirectoryService;
use crate::upstream::DirectorySource;

/// Upstream source serving a fixed list of pages, tokens `page-1`, `page-2`, ...
#[derive(Default)]
pub struct ScriptedSource {
    pages: Mutex<Vec<Vec<UpstreamUser>>>,
    failing_page: Mutex<Option<usize>>,
    cancel_after_page: Mutex<Option<(usize, CancellationToken)>>,
    requests: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(pages: Vec<Vec<UpstreamUser>>) -> Self {
        Self {
            pages: Mutex::new(pages),
            ..Self::default()
        }
    }

    pub fn set_pages(&self, pages: Vec<Vec<UpstreamUser>>) {
        *self.pages.lock().unwrap() = pages;
    }

    /// Fail every request for the given zero-based page index.
    pub fn fail_on_page(&self, index: Option<usize>) {
        *self.failing_page.lock().unwrap() = index;
    }

    /// Cancel `token` right after serving the given page.
    pub fn cancel_after_page(&self, index: usize, token: CancellationToken) {
        *self.cancel_after_page.lock().unwrap() = Some((index, token));
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl DirectorySource for ScriptedSource {
    async fn list_page(&self, page_token: Option<&str>, _page_size: u32) -> Result<UpstreamPage> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let index = page_token
            .and_then(|token| token.strip_prefix("page-"))
            .and_then(|raw| raw.parse::<usize>().ok())
            .unwrap_or(0);

        if *self.failing_page.lock().unwrap() == Some(index) {
            return Err(Error::Upstream(format!("page {index} unavailable")));
        }

        let pages = self.pages.lock().unwrap().clone();
        let users = pages.get(index).cloned().unwrap_or_default();
        let next_page_token = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));

        if let Some((cancel_index, token)) = self.cancel_after_page.lock().unwrap().as_ref() {
            if *cancel_index == index {
                token.cancel();
            }
        }

        Ok(UpstreamPage {
            users,
            next_page_token,
        })
    }
}

/// Store that delegates to a real service but fails a chosen `save_page` call.
pub struct FlakyStore {
    pub inner: DirectoryService,
    fail_on_save: usize,
    saves: AtomicUsize,
}

impl FlakyStore {
    /// `fail_on_save` is the one-based `save_page` call that errors.
    pub const fn new(inner: DirectoryService, fail_on_save: usize) -> Self {
        Self {
            inner,
            fail_on_save,
            saves: AtomicUsize::new(0),
        }
    }
}

impl DirectoryStore for FlakyStore {
    async fn load_active(&self) -> Result<Vec<LocalUser>> {
        self.inner.load_active().await
    }

    async fn save_page(&self, updated: &[UserUpdate], inserted: &[LocalUser]) -> Result<()> {
        let call = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on_save {
            return Err(Error::Database("disk I/O error".to_string()));
        }
        self.inner.save_page(updated, inserted).await
    }

    async fn soft_delete(&self, ids: &[String], at: i64) -> Result<u64> {
        self.inner.soft_delete(ids, at).await
    }
}

/// Store that applies an administrative rename right before the first
/// `save_page`, the way a concurrent operator edit lands mid-cycle.
pub struct InterleavedRenameStore {
    pub inner: DirectoryService,
    rename: Mutex<Option<(String, String)>>,
}

impl InterleavedRenameStore {
    pub fn new(inner: DirectoryService, id: &str, display_name: &str) -> Self {
        Self {
            inner,
            rename: Mutex::new(Some((id.to_string(), display_name.to_string()))),
        }
    }
}

impl DirectoryStore for InterleavedRenameStore {
    async fn load_active(&self) -> Result<Vec<LocalUser>> {
        self.inner.load_active().await
    }

    async fn save_page(&self, updated: &[UserUpdate], inserted: &[LocalUser]) -> Result<()> {
        let rename = self.rename.lock().unwrap().take();
        if let Some((id, display_name)) = rename {
            self.inner.set_display_name(&id, &display_name).await?;
        }
        self.inner.save_page(updated, inserted).await
    }

    async fn soft_delete(&self, ids: &[String], at: i64) -> Result<u64> {
        self.inner.soft_delete(ids, at).await
    }
}

/// Source whose page tokens cycle through a fixed list, never ending the listing.
pub struct LoopingTokenSource {
    tokens: Vec<String>,
    requests: AtomicUsize,
}

impl LoopingTokenSource {
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            tokens: tokens.iter().map(|token| (*token).to_string()).collect(),
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl DirectorySource for LoopingTokenSource {
    async fn list_page(&self, _page_token: Option<&str>, _page_size: u32) -> Result<UpstreamPage> {
        let call = self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(UpstreamPage {
            users: vec![upstream("u1", "Alice", false)],
            next_page_token: Some(self.tokens[call % self.tokens.len()].clone()),
        })
    }
}

pub fn upstream(id: &str, name: &str, disabled: bool) -> UpstreamUser {
    UpstreamUser::new(id)
        .with_display_name(name)
        .with_email(format!("{id}@example.com"))
        .with_disabled(disabled)
}
