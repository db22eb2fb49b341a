//! Backup tree layout
//!
//! Pure helpers that decide which pages belong to a book, how they are
//! grouped and ordered, and where each one lands on disk:
//!
//! ```text
//! <backup-path>/<YYYY-MM-DD>/[shelve_<id>/]book_<id>/Kapitel_<chapter>/<NN>_<name>.md
//! ```

use crate::api::PageMeta;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Pages of one book keyed by chapter id
pub type ChapterGroups = BTreeMap<u64, Vec<PageMeta>>;

/// Keeps the pages whose `book_id` equals `book_id`, in listing order
pub fn filter_by_book(pages: Vec<PageMeta>, book_id: u64) -> Vec<PageMeta> {
    pages.into_iter().filter(|p| p.book_id == book_id).collect()
}

/// Partitions pages by chapter id, keeping listing order inside each group
pub fn group_by_chapter(pages: Vec<PageMeta>) -> ChapterGroups {
    let mut chapters = ChapterGroups::new();
    for page in pages {
        chapters.entry(page.chapter_id).or_default().push(page);
    }
    chapters
}

/// Sorts pages by lowercase name; equal names keep their relative order
pub fn sort_by_name(pages: &mut [PageMeta]) {
    pages.sort_by_cached_key(|p| p.name.to_lowercase());
}

/// Returns true for characters that may appear in an exported file name
fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, 'Ä' | 'ä' | 'Ö' | 'ö' | 'Ü' | 'ü' | 'ß' | ' ' | '-' | '_')
}

/// Replaces every disallowed character with `_`, one for one
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if is_allowed(c) { c } else { '_' })
        .collect()
}

/// File name for the page at 1-based position `number` in its chapter
pub fn page_filename(number: usize, name: &str) -> String {
    format!("{:02}_{}.md", number, sanitize_filename(name))
}

/// Directory holding one day's backups
pub fn date_dir(backup_path: &Path, date: NaiveDate) -> PathBuf {
    backup_path.join(date.format("%Y-%m-%d").to_string())
}

/// Root directory of one book, with a shelve segment if it was reached via a shelve
pub fn book_root(backup_path: &Path, date: NaiveDate, shelve_id: Option<u64>, book_id: u64) -> PathBuf {
    let mut root = date_dir(backup_path, date);
    if let Some(shelve_id) = shelve_id {
        root.push(format!("shelve_{}", shelve_id));
    }
    root.push(format!("book_{}", book_id));
    root
}

/// Directory of one chapter below a book root
pub fn chapter_dir(book_root: &Path, chapter_id: u64) -> PathBuf {
    book_root.join(format!("Kapitel_{}", chapter_id))
}
