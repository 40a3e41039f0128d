//! Boundary to the remote search/statistics service.

use crate::error::RemoteError;
use crate::record::{ChannelStats, SearchPage};

/// Paginated channel search plus batched statistics lookup.
///
/// Every call names the credential it runs under; implementations keep no
/// rotation state of their own.
pub trait CatalogClient {
    fn search_channels(
        &self,
        credential: &str,
        query: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<SearchPage, RemoteError>;

    /// Stats for `ids`, in the order the service returned them. Unknown ids are
    /// simply absent from the result.
    fn channel_stats(&self, credential: &str, ids: &[String]) -> Result<Vec<ChannelStats>, RemoteError>;
}

impl<C: CatalogClient + ?Sized> CatalogClient for &C {
    fn search_channels(
        &self,
        credential: &str,
        query: &str,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<SearchPage, RemoteError> {
        (**self).search_channels(credential, query, page_token, page_size)
    }

    fn channel_stats(&self, credential: &str, ids: &[String]) -> Result<Vec<ChannelStats>, RemoteError> {
        (**self).channel_stats(credential, ids)
    }
}
