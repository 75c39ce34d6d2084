//! Directory user repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::error::{Error, Result};
use crate::models::{LocalUser, UserUpdate};
use libsql::{params, Connection, Row};

const USER_COLUMNS: &str = "id, display_name, last_synced_display_name, disabled, \
     last_synced_disabled, is_deleted, created_at, updated_at";

/// Trait for directory user storage operations (async)
#[allow(async_fn_in_trait)]
pub trait UserRepository {
    /// Get a user by ID, including soft-deleted rows
    async fn get(&self, id: &str) -> Result<Option<LocalUser>>;

    /// All users that are not soft-deleted
    async fn list_active(&self) -> Result<Vec<LocalUser>>;

    /// List users ordered by ID
    async fn list(
        &self,
        include_deleted: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LocalUser>>;

    /// Persist one page of reconciliation results atomically
    async fn apply_page(&self, updated: &[UserUpdate], inserted: &[LocalUser]) -> Result<()>;

    /// Soft delete the given users
    async fn soft_delete(&self, ids: &[String], at: i64) -> Result<u64>;

    /// Administrative override of the effective display name
    async fn set_display_name(&self, id: &str, display_name: &str) -> Result<LocalUser>;

    /// Administrative override of the effective disabled status
    async fn set_disabled(&self, id: &str, disabled: bool) -> Result<LocalUser>;
}

/// libSQL implementation of `UserRepository`
pub struct LibSqlUserRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlUserRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_user(row: &Row) -> Result<LocalUser> {
        Ok(LocalUser {
            id: row.get(0)?,
            display_name: row.get(1)?,
            last_synced_display_name: row.get(2)?,
            disabled: row.get::<i32>(3)? != 0,
            last_synced_disabled: row.get::<i32>(4)? != 0,
            is_deleted: row.get::<i32>(5)? != 0,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }

    async fn collect_users(&self, mut rows: libsql::Rows) -> Result<Vec<LocalUser>> {
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(Self::parse_user(&row)?);
        }
        Ok(users)
    }

    // Effective columns keep their stored value unless the merge propagated
    // upstream into them.
    async fn write_sync_fields(&self, update: &UserUpdate) -> Result<()> {
        let user = &update.user;
        self.conn
            .execute(
                "UPDATE directory_users
                 SET display_name = CASE WHEN ?1 THEN ?2 ELSE display_name END,
                     last_synced_display_name = ?3,
                     disabled = CASE WHEN ?4 THEN ?5 ELSE disabled END,
                     last_synced_disabled = ?6,
                     updated_at = ?7
                 WHERE id = ?8",
                params![
                    i32::from(update.display_name_propagated),
                    user.display_name.as_str(),
                    user.last_synced_display_name.as_str(),
                    i32::from(update.disabled_propagated),
                    i32::from(user.disabled),
                    i32::from(user.last_synced_disabled),
                    user.updated_at,
                    user.id.as_str()
                ],
            )
            .await?;
        Ok(())
    }

    // A previously soft-deleted row with the same id is revived in place and
    // reseeded; an active row is never touched by an insert.
    async fn insert_or_revive(&self, user: &LocalUser) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO directory_users (
                    id, display_name, last_synced_display_name, disabled,
                    last_synced_disabled, is_deleted, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                    display_name = excluded.display_name,
                    last_synced_display_name = excluded.last_synced_display_name,
                    disabled = excluded.disabled,
                    last_synced_disabled = excluded.last_synced_disabled,
                    is_deleted = 0,
                    updated_at = excluded.updated_at
                 WHERE directory_users.is_deleted = 1",
                params![
                    user.id.as_str(),
                    user.display_name.as_str(),
                    user.last_synced_display_name.as_str(),
                    i32::from(user.disabled),
                    i32::from(user.last_synced_disabled),
                    user.created_at,
                    user.updated_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn require(&self, id: &str) -> Result<LocalUser> {
        self.get(id)
            .await?
            .filter(|user| !user.is_deleted)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

impl UserRepository for LibSqlUserRepository<'_> {
    async fn get(&self, id: &str) -> Result<Option<LocalUser>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {USER_COLUMNS} FROM directory_users WHERE id = ?1"),
                [id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_user(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_active(&self) -> Result<Vec<LocalUser>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM directory_users WHERE is_deleted = 0 ORDER BY id"
                ),
                (),
            )
            .await?;
        self.collect_users(rows).await
    }

    async fn list(
        &self,
        include_deleted: bool,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<LocalUser>> {
        let rows = self
            .conn
            .query(
                &format!(
                    "SELECT {USER_COLUMNS} FROM directory_users
                     WHERE (?1 = 1 OR is_deleted = 0)
                     ORDER BY id
                     LIMIT ?2 OFFSET ?3"
                ),
                params![i32::from(include_deleted), limit as i64, offset as i64],
            )
            .await?;
        self.collect_users(rows).await
    }

    async fn apply_page(&self, updated: &[UserUpdate], inserted: &[LocalUser]) -> Result<()> {
        if updated.is_empty() && inserted.is_empty() {
            return Ok(());
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        for update in updated {
            if let Err(e) = self.write_sync_fields(update).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }
        for user in inserted {
            if let Err(e) = self.insert_or_revive(user).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        Ok(())
    }

    async fn soft_delete(&self, ids: &[String], at: i64) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        let mut affected = 0;
        for id in ids {
            match self
                .conn
                .execute(
                    "UPDATE directory_users SET is_deleted = 1, updated_at = ?1
                     WHERE id = ?2 AND is_deleted = 0",
                    params![at, id.as_str()],
                )
                .await
            {
                Ok(rows) => affected += rows,
                Err(e) => {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
            }
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        Ok(affected)
    }

    async fn set_display_name(&self, id: &str, display_name: &str) -> Result<LocalUser> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(Error::InvalidInput(
                "display name cannot be empty".to_string(),
            ));
        }

        let rows = self
            .conn
            .execute(
                "UPDATE directory_users SET display_name = ?1 WHERE id = ?2 AND is_deleted = 0",
                params![display_name, id],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        self.require(id).await
    }

    async fn set_disabled(&self, id: &str, disabled: bool) -> Result<LocalUser> {
        let rows = self
            .conn
            .execute(
                "UPDATE directory_users SET disabled = ?1 WHERE id = ?2 AND is_deleted = 0",
                params![i32::from(disabled), id],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }

        self.require(id).await
    }
}
