//! `courier-ledger` — durable publication history on SQLite.
//!
//! The ledger is the process's only persistent state: a `published` table
//! mapping post fingerprints to their publication timestamp (insert-once,
//! never updated, never deleted) plus two singleton housekeeping values in a
//! `meta` table. It survives arbitrary process kills; anything recorded here
//! is never published again.

pub mod db;
pub mod error;
pub mod ledger;

pub use error::{LedgerError, Result};
pub use ledger::PublicationLedger;
