//! `courier-engine` — due-item scheduling and deduplication.
//!
//! # Overview
//!
//! Each invocation is short-lived and stateless; the [ledger] is the only
//! memory between runs. The engine resolves which catalog posts are due
//! (window test + ledger absence), publishes them sequentially under a
//! per-run cap and a global anti-duplicate cooldown, records every success
//! immediately, and finishes with the once-per-day summary.
//!
//! The operating model is adversarial: the process can be killed between any
//! two steps, invocations can be delayed arbitrarily, and the clock can
//! drift. The invariants that survive all of that:
//!
//! | Property     | Mechanism                                                |
//! |--------------|----------------------------------------------------------|
//! | No duplicate | fingerprint recorded synchronously after each success    |
//! | No loss      | failures stay un-recorded → retried while in window      |
//! | Rate limit   | cooldown gate at entry, re-checked after every success   |
//! | One summary  | `last_summary_date` flips before a second can fire       |
//!
//! [ledger]: courier_ledger::PublicationLedger

pub mod driver;
pub mod error;
pub mod fingerprint;
pub mod resolver;
pub mod summary;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use driver::run;
pub use error::{EngineError, Result};
pub use traits::{Notifier, Receipt, Transport, TransportError};
pub use types::{DueCandidate, DueSet, RunReport, SkipReason};
