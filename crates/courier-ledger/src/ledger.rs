use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension};
use tracing::{info, warn};

use crate::db::init_db;
use crate::error::Result;

/// Timestamps are operator-local wall time throughout; the catalog has no
/// zone information, so neither does the ledger.
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

const META_LAST_PUBLICATION: &str = "last_publication_at";
const META_LAST_SUMMARY: &str = "last_summary_date";

/// Durable dedup memory: fingerprint → publication timestamp, plus the two
/// housekeeping singletons used for cooldown and once-per-day reporting.
pub struct PublicationLedger {
    conn: Connection,
}

impl PublicationLedger {
    /// Open (or create) the ledger at `path`, initialising the schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory ledger — tests and the last-resort recovery path.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    /// Fail-open variant of [`open`]: an unreadable or corrupt store is
    /// sidelined and replaced with a fresh one rather than refusing to run.
    /// Losing dedup history risks bounded re-publication; blocking all
    /// publication indefinitely is worse.
    ///
    /// Returns the ledger and, when recovery happened, a human-readable
    /// reason to surface as a `LedgerDegraded` event.
    ///
    /// [`open`]: PublicationLedger::open
    pub fn open_or_recover(path: &Path) -> Result<(Self, Option<String>)> {
        let first_err = match Self::open(path) {
            Ok(ledger) => return Ok((ledger, None)),
            Err(e) => e,
        };

        warn!(path = %path.display(), error = %first_err, "ledger unreadable, sidelining");
        let sidelined = sideline(path);

        match Self::open(path) {
            Ok(ledger) => {
                info!(path = %path.display(), "ledger restarted empty");
                Ok((
                    ledger,
                    Some(format!(
                        "ledger at {} was unreadable ({first_err}); {sidelined}",
                        path.display()
                    )),
                ))
            }
            Err(second_err) => {
                // Even a fresh file fails (permissions, full disk). Run with
                // an in-memory ledger: dedup holds within this invocation only.
                warn!(error = %second_err, "fresh ledger failed too, falling back to memory");
                let ledger = Self::open_in_memory()?;
                Ok((
                    ledger,
                    Some(format!(
                        "ledger at {} is unusable ({second_err}); running without durable dedup",
                        path.display()
                    )),
                ))
            }
        }
    }

    /// Has this fingerprint been published, and when?
    pub fn lookup(&self, fingerprint: &str) -> Result<Option<NaiveDateTime>> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT published_at FROM published WHERE fingerprint = ?1",
                [fingerprint],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stored.and_then(|s| parse_ts("published_at", &s)))
    }

    /// Record a successful publication. Idempotent: a fingerprint already
    /// present keeps its original timestamp and the call is a no-op.
    pub fn record(&self, fingerprint: &str, published_at: NaiveDateTime) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO published (fingerprint, published_at) VALUES (?1, ?2)",
            rusqlite::params![fingerprint, published_at.format(TS_FORMAT).to_string()],
        )?;
        Ok(())
    }

    /// Most recent successful publication, any post. Drives the cooldown gate.
    pub fn last_publication_at(&self) -> Result<Option<NaiveDateTime>> {
        Ok(self
            .get_meta(META_LAST_PUBLICATION)?
            .and_then(|s| parse_ts(META_LAST_PUBLICATION, &s)))
    }

    pub fn set_last_publication_at(&self, at: NaiveDateTime) -> Result<()> {
        self.set_meta(META_LAST_PUBLICATION, &at.format(TS_FORMAT).to_string())
    }

    /// Last calendar date a daily summary was emitted.
    pub fn last_summary_date(&self) -> Result<Option<NaiveDate>> {
        Ok(self.get_meta(META_LAST_SUMMARY)?.and_then(|s| {
            let parsed = NaiveDate::parse_from_str(&s, DATE_FORMAT).ok();
            if parsed.is_none() {
                warn!(value = %s, "unparseable last_summary_date, treating as unset");
            }
            parsed
        }))
    }

    pub fn set_last_summary_date(&self, date: NaiveDate) -> Result<()> {
        self.set_meta(META_LAST_SUMMARY, &date.format(DATE_FORMAT).to_string())
    }

    /// Checkpoint the WAL so everything recorded this run is in the main
    /// database file. Each `record` is already committed synchronously; this
    /// bounds the window a crash could leave in the log.
    pub fn flush(&self) -> Result<()> {
        self.conn
            .query_row("PRAGMA wal_checkpoint(PASSIVE)", [], |_| Ok(()))
            .optional()?;
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?)
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)",
            [key, value],
        )?;
        Ok(())
    }
}

fn parse_ts(key: &str, stored: &str) -> Option<NaiveDateTime> {
    let parsed = NaiveDateTime::parse_from_str(stored, TS_FORMAT).ok();
    if parsed.is_none() {
        warn!(key, value = %stored, "unparseable stored timestamp, treating as unset");
    }
    parsed
}

/// Move an unreadable ledger out of the way, together with any WAL leftovers
/// that would otherwise be replayed into the fresh database.
fn sideline(path: &Path) -> String {
    let stamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let target = format!("{}.corrupt-{stamp}", path.display());

    for suffix in ["-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }

    match std::fs::rename(path, &target) {
        Ok(()) => format!("sidelined to {target}"),
        Err(e) => {
            let _ = std::fs::remove_file(path);
            format!("sideline failed ({e}), file removed")
        }
    }
}
