//! The publication loop: due set in, deliveries out, ledger kept true.
//!
//! Strictly sequential — publication order and cooldown bookkeeping depend
//! on each post's outcome, so there is deliberately no concurrency here.

use chrono::{Duration, NaiveDateTime};
use courier_core::{Post, RunEvent, RunPolicy};
use courier_ledger::PublicationLedger;
use tracing::{info, warn};

use crate::error::Result;
use crate::resolver;
use crate::summary;
use crate::traits::{Notifier, Transport};
use crate::types::{RunReport, SkipReason};

/// Execute one full invocation: resolve, publish, summarize, flush.
///
/// The single entry point for a host process. `now` is a parameter, not a
/// clock read, so runs are replayable and testable.
pub async fn run(
    now: NaiveDateTime,
    posts: &[Post],
    ledger: &PublicationLedger,
    transport: &dyn Transport,
    notifier: &dyn Notifier,
    policy: &RunPolicy,
) -> Result<RunReport> {
    let report = publish_due(now, posts, ledger, transport, notifier, policy).await?;
    summary::maybe_emit(now, posts, ledger, notifier, policy).await?;

    // One checkpoint per run. Each record was already committed
    // synchronously, so a kill at any point loses no completed publication.
    ledger.flush()?;

    info!(
        due = report.due_count,
        published = report.published_count,
        failed = report.failed_count,
        invalid = report.invalid_count,
        skipped = ?report.skipped,
        "run complete"
    );
    Ok(report)
}

async fn publish_due(
    now: NaiveDateTime,
    posts: &[Post],
    ledger: &PublicationLedger,
    transport: &dyn Transport,
    notifier: &dyn Notifier,
    policy: &RunPolicy,
) -> Result<RunReport> {
    let due = resolver::resolve(now, posts, ledger, policy)?;
    let mut report = RunReport {
        due_count: due.eligible_total,
        invalid_count: due.invalid_count,
        published_count: 0,
        failed_count: 0,
        skipped: None,
    };

    if due.candidates.is_empty() {
        // A zero cap can empty the candidate list while posts are due.
        if due.eligible_total > 0 {
            report.skipped = Some(SkipReason::MaxPerRun);
        }
        return Ok(report);
    }

    // Global gate: if any publication happened within the anti-duplicate
    // interval, this whole run publishes nothing. A skip, not a failure —
    // and observable, so "rate-limited" is never mistaken for "nothing due".
    if let Some(since_last) = cooldown_active(now, ledger, policy)? {
        info!(since_last_minutes = since_last, "run skipped: cooldown active");
        notifier
            .emit(&RunEvent::RunSkippedCooldown {
                since_last_minutes: since_last,
            })
            .await;
        report.skipped = Some(SkipReason::Cooldown);
        return Ok(report);
    }

    let total = due.candidates.len();
    for (i, candidate) in due.candidates.iter().enumerate() {
        match transport.publish(&candidate.post).await {
            Ok(receipt) => {
                ledger.record(&candidate.fingerprint, now)?;
                ledger.set_last_publication_at(now)?;
                report.published_count += 1;
                info!(
                    fingerprint = %candidate.fingerprint,
                    scheduled_at = %candidate.scheduled_at,
                    lateness_minutes = candidate.lateness_minutes,
                    message_id = receipt.message_id,
                    "published"
                );
                notifier
                    .emit(&RunEvent::Published {
                        fingerprint: candidate.fingerprint.clone(),
                        scheduled_at: candidate.scheduled_at,
                        lateness_minutes: candidate.lateness_minutes,
                    })
                    .await;

                if i + 1 < total {
                    // Re-evaluate the cooldown live: the publication that
                    // just succeeded normally activates it, ending the run
                    // even though candidates remain.
                    if cooldown_active(now, ledger, policy)?.is_some() {
                        report.skipped = Some(SkipReason::Cooldown);
                        break;
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(
                        policy.inter_post_delay_ms,
                    ))
                    .await;
                }
            }
            Err(e) => {
                // Not recorded: the post stays eligible and is retried on
                // the next run while still inside the window.
                warn!(
                    scheduled_at = %candidate.scheduled_at,
                    error = %e,
                    "publication failed"
                );
                report.failed_count += 1;
                notifier
                    .emit(&RunEvent::PublicationFailed {
                        scheduled_at: candidate.scheduled_at,
                        error: e.to_string(),
                    })
                    .await;
            }
        }
    }

    if report.skipped.is_none() && due.eligible_total > due.candidates.len() {
        report.skipped = Some(SkipReason::MaxPerRun);
    }

    Ok(report)
}

/// Minutes since the last publication when the anti-duplicate interval is
/// still active, `None` otherwise. A `last_publication_at` in the future
/// (clock skew between hosts) counts as active — the conservative reading.
fn cooldown_active(
    now: NaiveDateTime,
    ledger: &PublicationLedger,
    policy: &RunPolicy,
) -> Result<Option<i64>> {
    if policy.anti_duplicate_minutes <= 0 {
        return Ok(None);
    }
    let Some(last) = ledger.last_publication_at()? else {
        return Ok(None);
    };
    let since = now - last;
    if since < Duration::minutes(policy.anti_duplicate_minutes) {
        Ok(Some(since.num_minutes()))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::testutil::{post_at, ts, RecordingNotifier, RecordingTransport};

    fn policy() -> RunPolicy {
        RunPolicy {
            lookback_minutes: 10,
            lookahead_minutes: 30,
            max_per_run: 1,
            anti_duplicate_minutes: 15,
            report_hour: 21,
            inter_post_delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn due_post_is_published_once_and_deduped() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();
        let posts = vec![post_at("2024-05-01 14:00", "hello channel")];

        let report = run(
            ts("2024-05-01 14:05"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 1);
        assert_eq!(report.due_count, 1);
        assert!(report.skipped.is_none());
        assert_eq!(
            ledger
                .lookup(&fingerprint(&posts[0]).unwrap())
                .unwrap(),
            Some(ts("2024-05-01 14:05"))
        );

        // Same catalog five minutes later: nothing due, nothing skipped.
        let report = run(
            ts("2024-05-01 14:10"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 0);
        assert_eq!(report.due_count, 0);
        assert!(report.skipped.is_none());
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn cooldown_gates_the_whole_run() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();

        let first = vec![post_at("2024-05-01 14:00", "first")];
        run(
            ts("2024-05-01 14:05"),
            &first,
            &ledger,
            &transport,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();

        // Five minutes later another post is due, but anti-dup is 15 min.
        let second = vec![post_at("2024-05-01 14:08", "second")];
        let report = run(
            ts("2024-05-01 14:10"),
            &second,
            &ledger,
            &transport,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 0);
        assert_eq!(report.due_count, 1);
        assert_eq!(report.skipped, Some(SkipReason::Cooldown));
        assert!(notifier
            .events()
            .iter()
            .any(|e| matches!(e, RunEvent::RunSkippedCooldown { .. })));
        assert_eq!(transport.sent(), vec!["first"]);
    }

    #[tokio::test]
    async fn cooldown_without_due_posts_is_silent() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        ledger
            .set_last_publication_at(ts("2024-05-01 14:00"))
            .unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();

        let report = run(
            ts("2024-05-01 14:05"),
            &[],
            &ledger,
            &transport,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();
        assert!(report.skipped.is_none());
        assert!(notifier.events().is_empty());
    }

    #[tokio::test]
    async fn per_run_cap_publishes_earliest_and_reports_the_rest() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();
        let posts = vec![
            post_at("2024-05-01 14:04", "third"),
            post_at("2024-05-01 14:00", "first"),
            post_at("2024-05-01 14:02", "second"),
        ];

        let report = run(
            ts("2024-05-01 14:05"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 1);
        assert_eq!(report.due_count, 3);
        assert_eq!(report.skipped, Some(SkipReason::MaxPerRun));
        assert_eq!(transport.sent(), vec!["first"]);

        // The two survivors go out on later runs, in slot order.
        let mut p = policy();
        p.anti_duplicate_minutes = 0;
        let report = run(
            ts("2024-05-01 14:06"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &p,
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 1);
        assert_eq!(transport.sent(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failed_publication_is_retried_next_run() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let notifier = RecordingNotifier::new();
        let posts = vec![post_at("2024-05-01 14:00", "flaky post")];

        let failing = RecordingTransport::failing_on("flaky");
        let report = run(
            ts("2024-05-01 14:05"),
            &posts,
            &ledger,
            &failing,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 0);
        assert_eq!(report.failed_count, 1);
        assert!(ledger
            .lookup(&fingerprint(&posts[0]).unwrap())
            .unwrap()
            .is_none());
        assert!(notifier
            .events()
            .iter()
            .any(|e| matches!(e, RunEvent::PublicationFailed { .. })));

        // Transport recovers; still inside the window; goes out.
        let healthy = RecordingTransport::new();
        let report = run(
            ts("2024-05-01 14:08"),
            &posts,
            &ledger,
            &healthy,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 1);
        assert_eq!(healthy.sent(), vec!["flaky post"]);
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_run() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::failing_on("bad");
        let notifier = RecordingNotifier::new();
        let posts = vec![
            post_at("2024-05-01 14:00", "bad apple"),
            post_at("2024-05-01 14:02", "good egg"),
        ];

        let mut p = policy();
        p.max_per_run = 5;
        p.anti_duplicate_minutes = 0;
        let report = run(
            ts("2024-05-01 14:05"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &p,
        )
        .await
        .unwrap();
        assert_eq!(report.failed_count, 1);
        assert_eq!(report.published_count, 1);
        assert_eq!(transport.sent(), vec!["good egg"]);
    }

    #[tokio::test]
    async fn live_cooldown_recheck_stops_the_loop() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();
        let posts = vec![
            post_at("2024-05-01 14:00", "first"),
            post_at("2024-05-01 14:02", "second"),
        ];

        // Cap allows both, but the first success activates the cooldown.
        let mut p = policy();
        p.max_per_run = 5;
        let report = run(
            ts("2024-05-01 14:05"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &p,
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 1);
        assert_eq!(report.skipped, Some(SkipReason::Cooldown));
        assert_eq!(transport.sent(), vec!["first"]);
    }

    #[tokio::test]
    async fn zero_cap_publishes_nothing_but_reports_why() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();
        let posts = vec![post_at("2024-05-01 14:00", "held back")];

        let mut p = policy();
        p.max_per_run = 0;
        let report = run(
            ts("2024-05-01 14:05"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &p,
        )
        .await
        .unwrap();
        assert_eq!(report.published_count, 0);
        assert_eq!(report.due_count, 1);
        assert_eq!(report.skipped, Some(SkipReason::MaxPerRun));
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn publications_are_in_slot_order() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();
        let posts = vec![
            post_at("2024-05-01 14:04", "c"),
            post_at("2024-05-01 14:00", "a"),
            post_at("2024-05-01 14:02", "b"),
        ];

        let mut p = policy();
        p.max_per_run = 5;
        p.anti_duplicate_minutes = 0;
        run(
            ts("2024-05-01 14:05"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &p,
        )
        .await
        .unwrap();
        assert_eq!(transport.sent(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn evening_run_appends_the_daily_summary() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();
        let posts = vec![post_at("2024-05-01 21:00", "evening post")];

        run(
            ts("2024-05-01 21:05"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();

        let events = notifier.events();
        assert!(matches!(events[0], RunEvent::Published { .. }));
        let Some(RunEvent::DailySummary {
            planned, published, ..
        }) = events.get(1)
        else {
            panic!("expected a DailySummary after the publish, got {events:?}");
        };
        assert_eq!((*planned, *published), (1, 1));
    }

    #[tokio::test]
    async fn published_event_carries_slot_and_lateness() {
        let ledger = PublicationLedger::open_in_memory().unwrap();
        let transport = RecordingTransport::new();
        let notifier = RecordingNotifier::new();
        let posts = vec![post_at("2024-05-01 14:00", "hello")];

        run(
            ts("2024-05-01 14:05"),
            &posts,
            &ledger,
            &transport,
            &notifier,
            &policy(),
        )
        .await
        .unwrap();

        let events = notifier.events();
        let Some(RunEvent::Published {
            scheduled_at,
            lateness_minutes,
            ..
        }) = events.first()
        else {
            panic!("expected a Published event, got {events:?}");
        };
        assert_eq!(*scheduled_at, ts("2024-05-01 14:00"));
        assert_eq!(*lateness_minutes, 5);
    }
}
