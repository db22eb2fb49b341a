//! BookStack API access
//!
//! This module wraps the three read endpoints the exporter uses:
//! - `GET /api/pages` (paginated listing of every page)
//! - `GET /api/shelves/{id}` (member books of a shelve)
//! - `GET /api/pages/{id}` (page detail including HTML)

mod fetcher;
mod types;

pub use fetcher::{FetchError, HttpFetcher, PageFetcher};
pub use types::{PageDetail, PageListing, PageMeta, Shelve, ShelveBook, NO_CHAPTER};

use crate::BackupError;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Number of listing records requested per call
pub const LISTING_PAGE_SIZE: u64 = 500;

/// Endpoint wrapper around a [`PageFetcher`] for one instance
#[derive(Clone)]
pub struct BookStackApi {
    base_url: String,
    fetcher: Arc<dyn PageFetcher>,
}

impl BookStackApi {
    /// Creates an API wrapper for `base_url`
    ///
    /// Trailing slashes on the base URL are ignored.
    pub fn new(base_url: &str, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            fetcher,
        }
    }

    /// Returns the normalized base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the complete page listing of the instance
    ///
    /// Follows the listing's `offset`/`count` pagination until the reported
    /// `total` is reached or the service returns an empty batch.
    pub async fn list_pages(&self) -> crate::Result<Vec<PageMeta>> {
        let mut pages = Vec::new();
        let mut offset = 0u64;

        loop {
            let url = format!(
                "{}/api/pages?count={}&offset={}",
                self.base_url, LISTING_PAGE_SIZE, offset
            );
            let listing: PageListing = self.get_json(&url, "page listing").await?;

            let received = listing.data.len() as u64;
            pages.extend(listing.data);
            offset += received;

            if received == 0 || offset >= listing.total {
                break;
            }
        }

        Ok(pages)
    }

    /// Fetches the member book ids of a shelve, in service order
    pub async fn shelve_books(&self, shelve_id: u64) -> crate::Result<Vec<u64>> {
        let url = format!("{}/api/shelves/{}", self.base_url, shelve_id);
        let shelve: Shelve = self
            .get_json(&url, &format!("shelve {}", shelve_id))
            .await?;
        Ok(shelve.book_ids())
    }

    /// Fetches the full record of one page
    pub async fn page_detail(&self, page_id: u64) -> crate::Result<PageDetail> {
        let url = format!("{}/api/pages/{}", self.base_url, page_id);
        self.get_json(&url, &format!("page {}", page_id)).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> crate::Result<T> {
        let body = self.fetcher.fetch(url).await?;
        serde_json::from_slice(&body).map_err(|source| BackupError::Parse {
            what: what.to_string(),
            source,
        })
    }
}
