//! Due-set resolution: which posts must go out on this invocation.
//!
//! Pure with respect to its inputs — reads the ledger, mutates nothing, so
//! the whole policy surface is testable against an in-memory ledger and a
//! frozen clock.

use chrono::{Duration, NaiveDateTime};
use courier_core::{Post, RunPolicy};
use courier_ledger::PublicationLedger;
use tracing::debug;

use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::types::{DueCandidate, DueSet};

/// Compute the ordered due set for `now`.
///
/// A post is due iff its slot lies in the closed window
/// `[now - lookback, now + lookahead]` and its fingerprint is not in the
/// ledger. One symmetric rule covers on-time publication, tolerance for a
/// delayed job runner, and catch-up of long-missed slots (large lookback).
///
/// Output is sorted earliest slot first — catalog order breaks ties — and
/// capped at `max_per_run`; `eligible_total` preserves the pre-cap count so
/// the caller can report what was left behind.
pub fn resolve(
    now: NaiveDateTime,
    posts: &[Post],
    ledger: &PublicationLedger,
    policy: &RunPolicy,
) -> Result<DueSet> {
    let window_start = now - Duration::minutes(policy.lookback_minutes.max(0));
    let window_end = now + Duration::minutes(policy.lookahead_minutes.max(0));

    let mut invalid_count = 0usize;
    let mut eligible: Vec<DueCandidate> = Vec::new();

    for post in posts {
        let (Some(scheduled_at), Some(fp)) = (post.scheduled_at, fingerprint(post)) else {
            // Malformed row: silently skipped, same verdict every run.
            invalid_count += 1;
            continue;
        };

        if scheduled_at < window_start || scheduled_at > window_end {
            continue;
        }

        if ledger.lookup(&fp)?.is_some() {
            continue;
        }

        eligible.push(DueCandidate {
            post: post.clone(),
            scheduled_at,
            lateness_minutes: (now - scheduled_at).num_minutes(),
            fingerprint: fp,
        });
    }

    // Stable sort: equal slots keep their catalog order.
    eligible.sort_by_key(|c| c.scheduled_at);

    let eligible_total = eligible.len();
    eligible.truncate(policy.max_per_run);

    debug!(
        eligible = eligible_total,
        capped = eligible.len(),
        invalid = invalid_count,
        "due set resolved"
    );

    Ok(DueSet {
        candidates: eligible,
        eligible_total,
        invalid_count,
    })
}
