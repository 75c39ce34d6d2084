//! idsync CLI - operator tooling for the reconciled identity directory
//!
//! Runs a one-off reconciliation cycle and lets administrators inspect users
//! or override their effective display name and disabled status.

mod cli;
mod commands;
mod error;


use clap::Parser;

use cli::{Cli, Commands, UsersCommands};
use commands::common::resolve_db_path;
use commands::sync::run_sync;
use commands::users::{run_list, run_rename, run_set_disabled, run_show};
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("idsync=warn".parse().expect("valid directive"))
                .add_directive("idsync_core=warn".parse().expect("valid directive")),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Sync { json } => run_sync(json, &db_path).await?,
        Commands::Users(UsersCommands::List {
            all,
            limit,
            offset,
            json,
        }) => run_list(all, limit, offset, json, &db_path).await?,
        Commands::Users(UsersCommands::Show { id, json }) => run_show(&id, json, &db_path).await?,
        Commands::Users(UsersCommands::Rename { id, name }) => {
            run_rename(&id, &name, &db_path).await?;
        }
        Commands::Users(UsersCommands::Disable { id }) => {
            run_set_disabled(&id, true, &db_path).await?;
        }
        Commands::Users(UsersCommands::Enable { id }) => {
            run_set_disabled(&id, false, &db_path).await?;
        }
    }

    Ok(())
}
