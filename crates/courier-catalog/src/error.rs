use thiserror::Error;

/// Errors that can occur while loading the catalog.
///
/// Malformed rows are not errors — they are skipped (and counted) downstream,
/// so a single bad spreadsheet line never blocks the whole schedule.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
