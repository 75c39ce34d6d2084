use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use idsync_core::config::DATABASE_PATH_VAR;
use idsync_core::services::DirectoryService;
use idsync_core::sync::CycleReport;
use idsync_core::LocalUser;
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct UserListItem {
    pub id: String,
    pub display_name: String,
    pub last_synced_display_name: String,
    pub display_name_overridden: bool,
    pub disabled: bool,
    pub last_synced_disabled: bool,
    pub disabled_overridden: bool,
    pub is_deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
}

pub fn user_to_list_item(user: &LocalUser) -> UserListItem {
    let now_ms = Utc::now().timestamp_millis();
    UserListItem {
        id: user.id.clone(),
        display_name: user.display_name.clone(),
        last_synced_display_name: user.last_synced_display_name.clone(),
        display_name_overridden: user.display_name_overridden(),
        disabled: user.disabled,
        last_synced_disabled: user.last_synced_disabled,
        disabled_overridden: user.disabled_overridden(),
        is_deleted: user.is_deleted,
        created_at: user.created_at,
        updated_at: user.updated_at,
        relative_time: format_relative_time(user.updated_at, now_ms),
    }
}

pub fn format_user_lines(users: &[LocalUser]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    users
        .iter()
        .map(|user| {
            let name = truncate_chars(&user.display_name, 32);
            let state = user_state_label(user);
            let relative_time = format_relative_time(user.updated_at, now_ms);
            let marker = if user.display_name_overridden() || user.disabled_overridden() {
                "*"
            } else {
                ""
            };
            format!("{:<28}  {name:<32}  {state:<8}  {relative_time}{marker}", user.id)
        })
        .collect()
}

pub fn format_user_details(user: &LocalUser) -> Vec<String> {
    let overridden = |flag: bool| if flag { " (local override)" } else { "" };
    vec![
        format!("id:            {}", user.id),
        format!(
            "display name:  {}{}",
            user.display_name,
            overridden(user.display_name_overridden())
        ),
        format!("  upstream:    {}", user.last_synced_display_name),
        format!(
            "disabled:      {}{}",
            user.disabled,
            overridden(user.disabled_overridden())
        ),
        format!("  upstream:    {}", user.last_synced_disabled),
        format!("deleted:       {}", user.is_deleted),
        format!("created:       {}", format_timestamp(user.created_at)),
        format!("updated:       {}", format_timestamp(user.updated_at)),
    ]
}

pub fn format_report_lines(report: &CycleReport) -> Vec<String> {
    let headline = if report.interrupted {
        "Sync interrupted before the upstream listing finished; no users were deleted"
    } else {
        "Sync completed"
    };
    vec![
        headline.to_string(),
        format!(
            "  pages={} seen={} inserted={} updated={} unchanged={} deleted={}",
            report.pages,
            report.seen,
            report.inserted,
            report.updated,
            report.unchanged,
            report.soft_deleted
        ),
    ]
}

pub const fn user_state_label(user: &LocalUser) -> &'static str {
    if user.is_deleted {
        "deleted"
    } else if user.disabled {
        "disabled"
    } else {
        "active"
    }
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < month {
        format!("{}d ago", diff / day)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_user_id(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyUserId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn normalize_display_name(parts: &[String]) -> Result<String, CliError> {
    let joined = parts.join(" ");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyDisplayName)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os(DATABASE_PATH_VAR).map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from("idsync.db"),
        |dir| dir.join("idsync").join("idsync.db"),
    )
}

pub async fn open_directory(path: &Path) -> Result<DirectoryService, CliError> {
    Ok(DirectoryService::open_path(path).await?)
}

pub async fn require_user(directory: &DirectoryService, id: &str) -> Result<LocalUser, CliError> {
    directory
        .get_user(id)
        .await?
        .ok_or_else(|| CliError::UserNotFound(id.to_string()))
}
