//! Database layer for idsync

mod connection;
mod migrations;
mod repository;

pub use connection::Database;
pub use repository::{LibSqlUserRepository, UserRepository};
