//! Three-way merge of upstream values into local directory records.
//!
//! Every synchronized attribute carries an effective value and a sync
//! baseline (the last upstream value seen). Comparing the three values tells
//! an upstream change apart from a deliberate local override:
//!
//! | upstream vs baseline | effective vs baseline | outcome                       |
//! |----------------------|-----------------------|-------------------------------|
//! | equal                | any                   | nothing changes               |
//! | different            | equal                 | baseline and effective follow |
//! | different            | different             | only the baseline advances    |
//!
//! Attributes are merged independently of each other.

use crate::models::{LocalUser, UpstreamUser, UserUpdate};
use crate::util::normalize_text_option;

/// Result of merging one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMerge {
    /// Upstream matches the baseline
    Unchanged,
    /// Upstream moved but the local override was kept
    BaselineAdvanced,
    /// Upstream moved and the effective value followed
    Propagated,
    /// No usable upstream value this cycle
    Skipped,
}

impl FieldMerge {
    /// Whether the record was mutated
    pub const fn mutated(self) -> bool {
        matches!(self, Self::BaselineAdvanced | Self::Propagated)
    }
}

/// Apply the three-way rule to a single attribute.
pub fn merge_field<T: PartialEq + Clone>(
    effective: &mut T,
    last_synced: &mut T,
    upstream: &T,
) -> FieldMerge {
    if upstream == last_synced {
        return FieldMerge::Unchanged;
    }

    let locally_modified = effective != last_synced;
    *last_synced = upstream.clone();

    if locally_modified {
        FieldMerge::BaselineAdvanced
    } else {
        *effective = upstream.clone();
        FieldMerge::Propagated
    }
}

/// The display name to mirror for an upstream user, falling back to the email.
pub fn resolve_display_name(upstream: &UpstreamUser) -> Option<String> {
    normalize_text_option(upstream.display_name.clone())
        .or_else(|| normalize_text_option(upstream.email.clone()))
}

/// Merge the upstream display name into `user`.
pub fn merge_display_name(user: &mut LocalUser, upstream: &UpstreamUser) -> FieldMerge {
    let Some(display_name) = resolve_display_name(upstream) else {
        tracing::warn!(
            user_id = %upstream.id,
            "Upstream user has neither display name nor email; skipping display name sync"
        );
        return FieldMerge::Skipped;
    };

    merge_field(
        &mut user.display_name,
        &mut user.last_synced_display_name,
        &display_name,
    )
}

/// Merge the upstream disabled status into `user`.
///
/// An unknown upstream status counts as disabled for the baseline, but is
/// never pushed into the effective value.
pub fn merge_disabled(user: &mut LocalUser, upstream: &UpstreamUser) -> FieldMerge {
    if let Some(disabled) = upstream.disabled {
        return merge_field(
            &mut user.disabled,
            &mut user.last_synced_disabled,
            &disabled,
        );
    }

    if user.last_synced_disabled {
        return FieldMerge::Unchanged;
    }

    tracing::warn!(
        user_id = %upstream.id,
        "Upstream user has no disabled status; recording baseline as disabled"
    );
    user.last_synced_disabled = true;
    FieldMerge::BaselineAdvanced
}

/// Merge every synchronized attribute; bumps `updated_at` when anything changed.
///
/// Returns the write needed to persist the merge, or `None` when the record
/// is already in step with upstream.
pub fn apply_upstream(
    user: &mut LocalUser,
    upstream: &UpstreamUser,
    now: i64,
) -> Option<UserUpdate> {
    let display_name = merge_display_name(user, upstream);
    let disabled = merge_disabled(user, upstream);

    if !display_name.mutated() && !disabled.mutated() {
        return None;
    }

    user.updated_at = now;
    Some(UserUpdate {
        user: user.clone(),
        display_name_propagated: display_name == FieldMerge::Propagated,
        disabled_propagated: disabled == FieldMerge::Propagated,
    })
}

/// Build the local record for a user seen upstream for the first time.
pub fn seed_from_upstream(upstream: &UpstreamUser, now: i64) -> LocalUser {
    let display_name = resolve_display_name(upstream).unwrap_or_else(|| {
        tracing::warn!(
            user_id = %upstream.id,
            "New upstream user has neither display name nor email; seeding an empty name"
        );
        String::new()
    });

    let mut user = LocalUser::seeded(
        upstream.id.clone(),
        display_name,
        upstream.disabled.unwrap_or(true),
        now,
    );
    user.created_at = upstream.created_at.unwrap_or(now);
    user
}
