//! Data models for idsync

mod user;

pub use user::{LocalUser, UpstreamPage, UpstreamUser, UserUpdate};
