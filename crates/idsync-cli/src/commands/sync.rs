use std::path::Path;

use idsync_core::config::EngineConfig;
use idsync_core::services::DirectoryService;
use idsync_core::sync::{CycleReport, Reconciler};
use idsync_core::upstream::{DirectorySource, HttpDirectorySource};
use tokio_util::sync::CancellationToken;

use crate::commands::common::{format_report_lines, open_directory};
use crate::error::CliError;

pub async fn run_sync(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let config = EngineConfig::from_env()?;
    let source = HttpDirectorySource::new(config.upstream)?;
    let directory = open_directory(db_path).await?;

    // Ctrl-C lets the current page finish, then stops without deleting anyone.
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received; stopping after the current page");
                cancel.cancel();
            }
        }
    });

    let result = reconcile_once(directory, source, config.page_size, &cancel).await;
    watcher.abort();
    let report = result?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in format_report_lines(&report) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn reconcile_once<D: DirectorySource>(
    directory: DirectoryService,
    source: D,
    page_size: u32,
    cancel: &CancellationToken,
) -> Result<CycleReport, CliError> {
    let reconciler = Reconciler::new(directory, source).with_page_size(page_size);
    Ok(reconciler.run_cycle(cancel).await?)
}
