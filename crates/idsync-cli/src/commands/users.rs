use std::path::Path;

use crate::commands::common::{
    format_user_details, format_user_lines, normalize_display_name, normalize_user_id,
    open_directory, require_user, user_to_list_item, UserListItem,
};
use crate::error::CliError;

pub async fn run_list(
    include_deleted: bool,
    limit: usize,
    offset: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let directory = open_directory(db_path).await?;
    let users = directory.list_users(include_deleted, limit, offset).await?;

    if as_json {
        let json_items = users
            .iter()
            .map(user_to_list_item)
            .collect::<Vec<UserListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users found.");
        return Ok(());
    }

    for line in format_user_lines(&users) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_show(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let id = normalize_user_id(id)?;
    let directory = open_directory(db_path).await?;
    let user = require_user(&directory, &id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&user_to_list_item(&user))?);
    } else {
        for line in format_user_details(&user) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_rename(id: &str, name_parts: &[String], db_path: &Path) -> Result<(), CliError> {
    let id = normalize_user_id(id)?;
    let display_name = normalize_display_name(name_parts)?;
    let directory = open_directory(db_path).await?;
    require_user(&directory, &id).await?;

    let user = directory.set_display_name(&id, &display_name).await?;
    println!("Renamed {} to '{}'", user.id, user.display_name);
    Ok(())
}

pub async fn run_set_disabled(id: &str, disabled: bool, db_path: &Path) -> Result<(), CliError> {
    let id = normalize_user_id(id)?;
    let directory = open_directory(db_path).await?;
    require_user(&directory, &id).await?;

    let user = directory.set_disabled(&id, disabled).await?;
    let verb = if user.disabled { "Disabled" } else { "Enabled" };
    println!("{verb} {}", user.id);
    Ok(())
}
