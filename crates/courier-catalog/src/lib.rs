//! `courier-catalog` — CSV schedule ingestion.
//!
//! Reads the operator-maintained spreadsheet export into [`Post`] records:
//! separator sniffing (`,` vs `;`), RFC-style quoting with doubled-quote
//! escapes, BOM/line-ending cleanup, column aliases and Google Drive link
//! rewriting. Rows missing their date, time or body are kept as malformed
//! posts so the engine can count them; they never become due.

use std::path::Path;

use courier_core::Post;

pub mod error;
pub mod normalize;
pub mod reader;
pub mod row;

pub use error::{CatalogError, Result};

/// Load and parse the catalog file at `path`.
pub fn load(path: &Path) -> Result<Vec<Post>> {
    let raw = std::fs::read_to_string(path)?;
    let records = reader::parse(&raw);
    let posts = row::build_posts(records);
    tracing::debug!(path = %path.display(), posts = posts.len(), "catalog loaded");
    Ok(posts)
}
