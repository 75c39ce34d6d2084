use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "idsync")]
#[command(about = "Inspect and administer the reconciled identity directory")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local directory database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one reconciliation cycle against the upstream directory
    Sync {
        /// Output the cycle report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Inspect or override local directory users
    #[command(subcommand)]
    Users(UsersCommands),
}

#[derive(Subcommand)]
pub enum UsersCommands {
    /// List users ordered by id
    List {
        /// Include soft-deleted users
        #[arg(long)]
        all: bool,
        /// Number of users to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Number of users to skip
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single user with its sync baseline
    Show {
        /// Upstream user id
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Override a user's display name locally
    Rename {
        /// Upstream user id
        id: String,
        /// New display name
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Disable a user locally
    Disable {
        /// Upstream user id
        id: String,
    },
    /// Re-enable a user locally
    Enable {
        /// Upstream user id
        id: String,
    },
}
