use thiserror::Error;

/// Errors that can occur within the ledger subsystem.
///
/// Unparseable stored values are deliberately NOT errors: the ledger prefers
/// degrading (treat as unset, log a warning) over blocking publication.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
