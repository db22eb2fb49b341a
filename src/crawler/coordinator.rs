//! Crawl coordinator - resolves a target and exports its pages
//!
//! One `crawl()` call walks the configured target:
//! - Book targets are exported directly
//! - Shelve targets are resolved into their member books first
//! - Each book's pages are grouped by chapter, sorted by name and written
//!   as numbered Markdown files
//!
//! Failures below target dispatch are logged and counted, never returned.

use crate::api::{BookStackApi, HttpFetcher, PageMeta};
use crate::config::{InstanceConfig, Target};
use crate::crawler::layout;
use crate::output::{convert_or_original, render_page, ExportWriter, Html2MdConverter, MarkdownConverter};
use chrono::{Local, NaiveDate};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Counters describing one finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Books fully walked (individual pages may still have failed)
    pub books: u64,
    /// Books aborted because the listing or the root directory failed
    pub books_failed: u64,
    /// Shelves whose record could not be fetched or parsed
    pub shelves_failed: u64,
    /// Chapters skipped because their directory could not be created
    pub chapters_skipped: u64,
    pub pages_written: u64,
    pub pages_failed: u64,
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} books ({} failed), {} shelves failed, {} chapters skipped, {} pages written ({} failed)",
            self.books,
            self.books_failed,
            self.shelves_failed,
            self.chapters_skipped,
            self.pages_written,
            self.pages_failed
        )
    }
}

/// Exports the target of one instance
pub struct Coordinator {
    instance: Arc<InstanceConfig>,
    api: BookStackApi,
    converter: Arc<dyn MarkdownConverter>,
    writer: ExportWriter,
    date: Option<NaiveDate>,
}

impl Coordinator {
    /// Creates a coordinator talking HTTP to the instance's base URL
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(BackupError)` - The HTTP client could not be built
    pub fn new(instance: Arc<InstanceConfig>) -> crate::Result<Self> {
        let fetcher = HttpFetcher::new(&instance)?;
        let api = BookStackApi::new(&instance.base_url, Arc::new(fetcher));
        Ok(Self::with_api(instance, api))
    }

    /// Creates a coordinator over an existing API wrapper
    pub fn with_api(instance: Arc<InstanceConfig>, api: BookStackApi) -> Self {
        Self {
            instance,
            api,
            converter: Arc::new(Html2MdConverter),
            writer: ExportWriter,
            date: None,
        }
    }

    /// Replaces the Markdown converter
    pub fn with_converter(mut self, converter: Arc<dyn MarkdownConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Pins the export date instead of reading the local clock per crawl
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Returns the instance this coordinator exports
    pub fn instance(&self) -> &InstanceConfig {
        &self.instance
    }

    /// Runs one full crawl of the configured target
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Target dispatch succeeded; deeper failures are counted
    /// * `Err(BackupError::UnsupportedTarget)` - The target type is not recognized;
    ///   nothing was fetched or written
    #[tracing::instrument(name = "crawl", skip_all, fields(instance = %self.instance.name))]
    pub async fn crawl(&self) -> crate::Result<CrawlReport> {
        let target = self.instance.target.resolve()?;
        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        let mut report = CrawlReport::default();

        tracing::info!("Starting {} crawl for ids {:?}", target.kind(), target.ids());

        match &target {
            Target::Book(ids) => {
                for &book_id in ids {
                    if let Err(e) = self.crawl_book(date, book_id, None, &mut report).await {
                        tracing::warn!("Error crawling book {}: {}", book_id, e);
                        report.books_failed += 1;
                    }
                }
            }
            Target::Shelve(ids) => {
                for &shelve_id in ids {
                    if let Err(e) = self.crawl_shelve(date, shelve_id, &mut report).await {
                        tracing::warn!("Error crawling shelve {}: {}", shelve_id, e);
                        report.shelves_failed += 1;
                    }
                }
            }
        }

        tracing::info!("Crawl complete: {}", report);
        Ok(report)
    }

    /// Resolves a shelve and exports each member book below `shelve_<id>/`
    async fn crawl_shelve(
        &self,
        date: NaiveDate,
        shelve_id: u64,
        report: &mut CrawlReport,
    ) -> crate::Result<()> {
        tracing::info!("Crawling shelve {}", shelve_id);

        let book_ids = self.api.shelve_books(shelve_id).await?;
        tracing::debug!("Shelve {} holds books {:?}", shelve_id, book_ids);

        for book_id in book_ids {
            if let Err(e) = self.crawl_book(date, book_id, Some(shelve_id), report).await {
                tracing::warn!("Error crawling book {} of shelve {}: {}", book_id, shelve_id, e);
                report.books_failed += 1;
            }
        }

        tracing::info!("Shelve {} crawl complete", shelve_id);
        Ok(())
    }

    /// Exports every page of one book
    ///
    /// Fails only when the page listing cannot be fetched or the book's root
    /// directory cannot be created.
    async fn crawl_book(
        &self,
        date: NaiveDate,
        book_id: u64,
        shelve_id: Option<u64>,
        report: &mut CrawlReport,
    ) -> crate::Result<()> {
        tracing::info!("Crawling book {}", book_id);

        let pages = layout::filter_by_book(self.api.list_pages().await?, book_id);

        let root = self.book_root(date, shelve_id, book_id);
        tracing::info!("Creating root directory: {}", root.display());
        self.writer.ensure_dir(&root)?;

        for (chapter_id, mut pages) in layout::group_by_chapter(pages) {
            let chapter_dir = layout::chapter_dir(&root, chapter_id);
            tracing::info!("Creating chapter directory: {}", chapter_dir.display());
            if let Err(e) = self.writer.ensure_dir(&chapter_dir) {
                tracing::warn!("Skipping chapter {} of book {}: {}", chapter_id, book_id, e);
                report.chapters_skipped += 1;
                continue;
            }

            layout::sort_by_name(&mut pages);
            self.export_chapter(&chapter_dir, &pages, report).await;
        }

        report.books += 1;
        tracing::info!("Book {} crawl complete", book_id);
        Ok(())
    }

    fn book_root(&self, date: NaiveDate, shelve_id: Option<u64>, book_id: u64) -> PathBuf {
        layout::book_root(&self.instance.backup_path, date, shelve_id, book_id)
    }

    /// Exports the sorted pages of one chapter
    ///
    /// Numbers are handed out to successfully fetched pages only, so a failed
    /// fetch shifts the following pages down instead of leaving a gap.
    async fn export_chapter(&self, chapter_dir: &Path, pages: &[PageMeta], report: &mut CrawlReport) {
        let mut number = 0;

        for meta in pages {
            let detail = match self.api.page_detail(meta.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!("Error processing page {}: {}", meta.id, e);
                    report.pages_failed += 1;
                    continue;
                }
            };
            number += 1;

            let body = convert_or_original(self.converter.as_ref(), &detail.html);
            let content = render_page(&detail.name, &body);
            let path = chapter_dir.join(layout::page_filename(number, &detail.name));

            match self.writer.write(&path, &content) {
                Ok(()) => {
                    tracing::debug!("Wrote page {} to {}", meta.id, path.display());
                    report.pages_written += 1;
                }
                Err(e) => {
                    tracing::warn!("Error writing page {}: {}", meta.id, e);
                    report.pages_failed += 1;
                }
            }
        }
    }
}
