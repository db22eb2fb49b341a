//! Output module for exported pages
//!
//! This module handles:
//! - Converting page HTML to Markdown (with raw-HTML fallback)
//! - Rendering the exported file content
//! - Writing files into the backup tree

mod markdown;
mod writer;

pub use markdown::{
    convert_or_original, render_page, ConvertError, Html2MdConverter, MarkdownConverter,
};
pub use writer::ExportWriter;
