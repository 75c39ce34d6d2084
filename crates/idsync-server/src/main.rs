mod config;
mod routes;

use std::sync::Arc;

use idsync_core::services::DirectoryService;
use idsync_core::sync::{Reconciler, SyncScheduler, SyncStatus};
use idsync_core::upstream::HttpDirectorySource;
use tokio_util::sync::CancellationToken;

use config::AppConfig;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("idsync_server=info".parse().expect("valid directive"))
                .add_directive("idsync_core=info".parse().expect("valid directive")),
        )
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting idsync-server with config: {:?}", config);

    // Both collaborators are built once; a bad endpoint or database aborts startup.
    let directory = DirectoryService::open_path(&config.engine.database_path).await?;
    let source = HttpDirectorySource::new(config.engine.upstream.clone())?;
    tracing::info!("Upstream directory endpoint: {}", source.endpoint());

    let reconciler = Reconciler::new(directory, source).with_page_size(config.engine.page_size);
    let sync_status = SyncStatus::new();
    let shutdown = CancellationToken::new();
    let scheduler = SyncScheduler::new(reconciler, config.engine.poll_interval())
        .with_status(sync_status.clone())
        .spawn(shutdown.clone());

    let state = AppState::new(config.clone(), sync_status);
    let bind_addr = state.config.bind_addr.clone();
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("idsync-server listening on {}", bind_addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    scheduler.await?;
    tracing::info!("idsync-server stopped");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                tracing::warn!("Failed to listen for shutdown signal: {error}");
            }
            tracing::info!("Shutdown requested; waiting for the current sync page to finish");
        }
        () = shutdown.cancelled() => {}
    }
    shutdown.cancel();
}
