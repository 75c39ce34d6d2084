//! Directory user models

use serde::{Deserialize, Serialize};

/// A locally-owned projection of an upstream identity.
///
/// `display_name` and `disabled` are the effective values the rest of the
/// system reads; administrators may override them. The `last_synced_*`
/// columns hold the last value observed upstream and are written only by the
/// reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
    /// Stable upstream identifier (primary key)
    pub id: String,
    /// Effective display name
    pub display_name: String,
    /// Display name last observed upstream
    pub last_synced_display_name: String,
    /// Effective disabled status
    pub disabled: bool,
    /// Disabled status last observed upstream
    pub last_synced_disabled: bool,
    /// Soft delete flag, set once the identity vanishes upstream
    pub is_deleted: bool,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last mutation by the engine (Unix ms)
    pub updated_at: i64,
}

impl LocalUser {
    /// Seed a new record from upstream values; effective and baseline start equal.
    #[must_use]
    pub fn seeded(id: impl Into<String>, display_name: String, disabled: bool, now: i64) -> Self {
        Self {
            id: id.into(),
            last_synced_display_name: display_name.clone(),
            display_name,
            disabled,
            last_synced_disabled: disabled,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the effective display name diverges from the sync baseline
    #[must_use]
    pub fn display_name_overridden(&self) -> bool {
        self.display_name != self.last_synced_display_name
    }

    /// Whether the effective disabled status diverges from the sync baseline
    #[must_use]
    pub const fn disabled_overridden(&self) -> bool {
        self.disabled != self.last_synced_disabled
    }
}

/// A user as reported by the upstream identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamUser {
    pub id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub disabled: Option<bool>,
    /// Account creation timestamp (Unix ms), when the provider reports one
    pub created_at: Option<i64>,
}

impl UpstreamUser {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
            disabled: None,
            created_at: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub const fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }
}

/// A reconciled record together with the effective columns the merge moved.
///
/// Baseline columns and `updated_at` are always written from `user`; the
/// effective `display_name` and `disabled` columns only when flagged, so an
/// override made while the cycle runs is not reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub user: LocalUser,
    pub display_name_propagated: bool,
    pub disabled_propagated: bool,
}

/// One page of an upstream directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamPage {
    pub users: Vec<UpstreamUser>,
    /// Token for the following page; `None` ends the enumeration
    pub next_page_token: Option<String>,
}
