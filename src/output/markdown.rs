//! HTML to Markdown conversion and page rendering
//!
//! Conversion never fails from the caller's point of view: when the
//! converter reports an error the original HTML is exported instead.

use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Error reported by a [`MarkdownConverter`]
#[derive(Debug, Error)]
#[error("markdown conversion failed: {0}")]
pub struct ConvertError(pub String);

/// Transforms HTML into Markdown
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, html: &str) -> Result<String, ConvertError>;
}

/// Converter backed by the `html2md` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct Html2MdConverter;

impl MarkdownConverter for Html2MdConverter {
    fn convert(&self, html: &str) -> Result<String, ConvertError> {
        panic::catch_unwind(AssertUnwindSafe(|| html2md::parse_html(html))).map_err(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "converter panicked".to_string());
            ConvertError(message)
        })
    }
}

/// Converts `html`, falling back to the unmodified input on failure
pub fn convert_or_original(converter: &dyn MarkdownConverter, html: &str) -> String {
    match converter.convert(html) {
        Ok(markdown) => markdown,
        Err(e) => {
            tracing::warn!("{}; exporting raw HTML", e);
            html.to_string()
        }
    }
}

/// Formats an exported page: level-1 heading, blank line, body
pub fn render_page(name: &str, body: &str) -> String {
    format!("# {}\n\n{}", name, body)
}
