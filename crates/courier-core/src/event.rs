//! Run outcome events — emitted by the engine, consumed by a notifier.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Everything an operator can observe about a run, as discrete events.
///
/// The engine fires these through the `Notifier` seam and never inspects
/// whether delivery worked — notification failures must not affect
/// publication bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunEvent {
    /// A post went out and was recorded in the ledger.
    Published {
        fingerprint: String,
        scheduled_at: NaiveDateTime,
        /// How late the post went out relative to its slot. Negative when an
        /// early trigger published ahead of schedule.
        lateness_minutes: i64,
    },
    /// The delivery call failed; the post stays eligible for the next run.
    PublicationFailed {
        scheduled_at: NaiveDateTime,
        error: String,
    },
    /// Posts were due, but the whole run was gated by the anti-duplicate
    /// interval. Distinct from "nothing was due", which emits no event.
    RunSkippedCooldown { since_last_minutes: i64 },
    /// Once-per-day planned/published aggregate.
    DailySummary {
        date: NaiveDate,
        planned: usize,
        published: usize,
    },
    /// The ledger could not be read and was restarted empty.
    LedgerDegraded { reason: String },
    /// The invocation aborted on an unexpected error.
    Fatal { message: String },
}

/// Coarse category used by the notify-mode filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Post,
    Report,
    Error,
}

impl RunEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RunEvent::Published { .. } => EventKind::Post,
            RunEvent::RunSkippedCooldown { .. } | RunEvent::DailySummary { .. } => {
                EventKind::Report
            }
            RunEvent::PublicationFailed { .. }
            | RunEvent::LedgerDegraded { .. }
            | RunEvent::Fatal { .. } => EventKind::Error,
        }
    }
}

/// Which event categories reach the owner chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    /// Publications and errors (the default).
    #[default]
    PostOnly,
    /// Everything, including daily reports and cooldown skips.
    All,
    /// Errors only.
    Silent,
}

impl NotifyMode {
    /// Errors always pass — an operator silencing chatter still needs to
    /// know about failed publications.
    pub fn allows(&self, kind: EventKind) -> bool {
        match (self, kind) {
            (_, EventKind::Error) => true,
            (NotifyMode::All, _) => true,
            (NotifyMode::PostOnly, EventKind::Post) => true,
            (NotifyMode::PostOnly, EventKind::Report) => false,
            (NotifyMode::Silent, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_always_pass_the_filter() {
        for mode in [NotifyMode::PostOnly, NotifyMode::All, NotifyMode::Silent] {
            assert!(mode.allows(EventKind::Error), "{mode:?} must pass errors");
        }
    }

    #[test]
    fn silent_drops_posts_and_reports() {
        assert!(!NotifyMode::Silent.allows(EventKind::Post));
        assert!(!NotifyMode::Silent.allows(EventKind::Report));
    }

    #[test]
    fn post_only_drops_reports() {
        assert!(NotifyMode::PostOnly.allows(EventKind::Post));
        assert!(!NotifyMode::PostOnly.allows(EventKind::Report));
    }

    #[test]
    fn event_kinds_are_stable() {
        let e = RunEvent::DailySummary {
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            planned: 3,
            published: 2,
        };
        assert_eq!(e.kind(), EventKind::Report);

        let e = RunEvent::LedgerDegraded {
            reason: "gone".into(),
        };
        assert_eq!(e.kind(), EventKind::Error);
    }
}
