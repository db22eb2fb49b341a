//! BookStack API payloads
//!
//! Only the fields the exporter needs are deserialized; everything else in
//! the responses is ignored.

use serde::Deserialize;

/// Chapter id used by pages that sit directly in a book
pub const NO_CHAPTER: u64 = 0;

/// Listing record for a page, as returned by `GET /api/pages`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageMeta {
    pub id: u64,
    pub name: String,
    pub book_id: u64,
    #[serde(default, deserialize_with = "chapter_or_none")]
    pub chapter_id: u64,
}

/// Full page record, as returned by `GET /api/pages/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct PageDetail {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub html: String,
}

/// One page of the paginated page listing
#[derive(Debug, Clone, Deserialize)]
pub struct PageListing {
    #[serde(default)]
    pub data: Vec<PageMeta>,
    #[serde(default)]
    pub total: u64,
}

/// Shelve record, as returned by `GET /api/shelves/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct Shelve {
    #[serde(default)]
    pub books: Vec<ShelveBook>,
}

/// Book entry inside a shelve record
#[derive(Debug, Clone, Deserialize)]
pub struct ShelveBook {
    pub id: u64,
}

impl Shelve {
    /// Member book ids in the order reported by the service
    pub fn book_ids(&self) -> Vec<u64> {
        self.books.iter().map(|b| b.id).collect()
    }
}

/// Accepts `null` for pages outside any chapter
fn chapter_or_none<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(NO_CHAPTER))
}
