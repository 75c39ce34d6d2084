//! Shared directory service wrapper used by the engine, server, and CLI.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{Database, LibSqlUserRepository, UserRepository};
use crate::models::{LocalUser, UserUpdate};
use crate::sync::DirectoryStore;
use crate::Result;

/// Thread-safe service for directory storage operations.
#[derive(Clone)]
pub struct DirectoryService {
    db: Arc<Mutex<Database>>,
}

impl DirectoryService {
    /// Open a directory service at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        tracing::info!("Opening directory database at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Open an in-memory directory service (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Fetch a user by id, including soft-deleted users.
    pub async fn get_user(&self, id: &str) -> Result<Option<LocalUser>> {
        let db = self.db.lock().await;
        LibSqlUserRepository::new(db.connection()).get(id).await
    }

    /// List users ordered by id.
    pub async fn list_users(
        &self,
        include_deleted: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LocalUser>> {
        let db = self.db.lock().await;
        LibSqlUserRepository::new(db.connection())
            .list(include_deleted, limit, offset)
            .await
    }

    /// Override a user's effective display name.
    pub async fn set_display_name(&self, id: &str, display_name: &str) -> Result<LocalUser> {
        let db = self.db.lock().await;
        LibSqlUserRepository::new(db.connection())
            .set_display_name(id, display_name)
            .await
    }

    /// Override a user's effective disabled status.
    pub async fn set_disabled(&self, id: &str, disabled: bool) -> Result<LocalUser> {
        let db = self.db.lock().await;
        LibSqlUserRepository::new(db.connection())
            .set_disabled(id, disabled)
            .await
    }
}

impl DirectoryStore for DirectoryService {
    async fn load_active(&self) -> Result<Vec<LocalUser>> {
        let db = self.db.lock().await;
        LibSqlUserRepository::new(db.connection())
            .list_active()
            .await
    }

    async fn save_page(&self, updated: &[UserUpdate], inserted: &[LocalUser]) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlUserRepository::new(db.connection())
            .apply_page(updated, inserted)
            .await
    }

    async fn soft_delete(&self, ids: &[String], at: i64) -> Result<u64> {
        let db = self.db.lock().await;
        LibSqlUserRepository::new(db.connection())
            .soft_delete(ids, at)
            .await
    }
}
