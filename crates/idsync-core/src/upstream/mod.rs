//! Upstream identity directory sources.

mod http;

use std::future::Future;

use crate::error::Result;
use crate::models::UpstreamPage;

pub use http::{HttpDirectorySource, HttpSourceConfig};

/// Paginated, read-only listing of the authoritative user directory.
///
/// The enumeration starts with `page_token = None` and ends when a page comes
/// back without a `next_page_token`.
pub trait DirectorySource: Send + Sync {
    fn list_page(
        &self,
        page_token: Option<&str>,
        page_size: u32,
    ) -> impl Future<Output = Result<UpstreamPage>> + Send;
}

impl<T: DirectorySource> DirectorySource for std::sync::Arc<T> {
    fn list_page(
        &self,
        page_token: Option<&str>,
        page_size: u32,
    ) -> impl Future<Output = Result<UpstreamPage>> + Send {
        (**self).list_page(page_token, page_size)
    }
}
