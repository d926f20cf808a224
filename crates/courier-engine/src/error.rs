use thiserror::Error;

/// Errors that abort a whole run.
///
/// Per-post delivery failures are NOT here — they are handled inside the
/// publish loop (event + retry on a later run) and never escalate.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Ledger error: {0}")]
    Ledger(#[from] courier_ledger::LedgerError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
