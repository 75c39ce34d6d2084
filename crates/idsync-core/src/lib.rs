//! idsync-core - Core library for idsync
//!
//! This crate contains the directory models, the local libSQL store, the
//! upstream identity provider client, and the reconciliation engine that keeps
//! the two in step. It is shared by the `idsync-server` daemon and the
//! `idsync` operator CLI.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod upstream;
pub mod util;

pub use error::{Error, Result};
pub use models::{LocalUser, UpstreamPage, UpstreamUser, UserUpdate};
