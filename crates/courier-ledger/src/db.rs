use rusqlite::Connection;

use crate::error::Result;

/// Initialise the ledger schema in `conn`. Safe to call on every startup
/// (idempotent).
///
/// `published` is append-only: one row per fingerprint, written the moment a
/// publication succeeds. `meta` holds the two housekeeping singletons
/// (`last_publication_at`, `last_summary_date`).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS published (
            fingerprint  TEXT NOT NULL PRIMARY KEY,
            published_at TEXT NOT NULL
        ) STRICT;

        CREATE TABLE IF NOT EXISTS meta (
            key   TEXT NOT NULL PRIMARY KEY,
            value TEXT NOT NULL
        ) STRICT;
        ",
    )?;
    Ok(())
}
