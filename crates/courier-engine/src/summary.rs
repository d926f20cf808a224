//! Once-per-day planned/published aggregate.

use chrono::{NaiveDateTime, Timelike};
use courier_core::{Post, RunEvent, RunPolicy};
use courier_ledger::PublicationLedger;
use tracing::info;

use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::traits::Notifier;

/// Emit today's summary if the report hour has passed and none was sent yet.
///
/// Monotonic and idempotent: `last_summary_date` flips to today on the first
/// firing and every later call that day is a no-op. A day on which no
/// invocation lands after the report hour simply gets no summary — there is
/// deliberately no retroactive catch-up for reports, unlike for posts.
///
/// Returns the `(planned, published)` counts when the step ran.
pub async fn maybe_emit(
    now: NaiveDateTime,
    posts: &[Post],
    ledger: &PublicationLedger,
    notifier: &dyn Notifier,
    policy: &RunPolicy,
) -> Result<Option<(usize, usize)>> {
    if now.hour() < policy.report_hour {
        return Ok(None);
    }
    let today = now.date();
    if ledger.last_summary_date()? == Some(today) {
        return Ok(None);
    }

    let mut planned = 0usize;
    let mut published = 0usize;
    for post in posts {
        let Some(scheduled_at) = post.scheduled_at else {
            continue;
        };
        if scheduled_at.date() != today {
            continue;
        }
        let Some(fp) = fingerprint(post) else {
            continue;
        };
        planned += 1;
        if ledger.lookup(&fp)?.is_some() {
            published += 1;
        }
    }

    // An all-zero report is noise — mark the date but stay quiet.
    if planned > 0 {
        info!(date = %today, planned, published, "daily summary");
        notifier
            .emit(&RunEvent::DailySummary {
                date: today,
                planned,
                published,
            })
            .await;
    }

    ledger.set_last_summary_date(today)?;
    Ok(Some((planned, published)))
}
