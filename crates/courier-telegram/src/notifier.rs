//! Owner notifications: run events forwarded to the operator's chat.

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{debug, warn};

use courier_core::{NotifyMode, RunEvent};
use courier_engine::Notifier;

/// Sends filtered run events to the owner chat, when one is configured.
///
/// Fire-and-forget by contract: a notification that cannot be delivered is
/// logged and dropped, never surfaced to the engine.
pub struct OwnerNotifier {
    bot: Bot,
    owner: Option<ChatId>,
    mode: NotifyMode,
}

impl OwnerNotifier {
    pub fn new(bot: Bot, owner_id: Option<i64>, mode: NotifyMode) -> Self {
        Self {
            bot,
            owner: owner_id.map(ChatId),
            mode,
        }
    }
}

#[async_trait]
impl Notifier for OwnerNotifier {
    async fn emit(&self, event: &RunEvent) {
        if !self.mode.allows(event.kind()) {
            return;
        }
        let Some(owner) = self.owner else {
            debug!(?event, "no owner chat configured, event not forwarded");
            return;
        };
        // Plain text on purpose: event payloads (error strings, post text
        // fragments) must never be parsed as markup.
        if let Err(e) = self.bot.send_message(owner, render(event)).await {
            warn!(error = %e, "owner notification failed");
        }
    }
}

/// Human-readable, single-message rendering of an event.
pub(crate) fn render(event: &RunEvent) -> String {
    match event {
        RunEvent::Published {
            scheduled_at,
            lateness_minutes,
            ..
        } => format!(
            "✅ Published: post scheduled {} ({})",
            scheduled_at.format("%Y-%m-%d %H:%M"),
            describe_lateness(*lateness_minutes),
        ),
        RunEvent::PublicationFailed {
            scheduled_at,
            error,
        } => format!(
            "❌ Publication failed: {}\n{error}",
            scheduled_at.format("%Y-%m-%d %H:%M"),
        ),
        RunEvent::RunSkippedCooldown { since_last_minutes } => format!(
            "⏳ Run skipped: last publication was {since_last_minutes} min ago"
        ),
        RunEvent::DailySummary {
            date,
            planned,
            published,
        } => format!(
            "📅 Daily report ({date}):\nPlanned today: {planned}\nActually published: {published}"
        ),
        RunEvent::LedgerDegraded { reason } => {
            format!("⚠️ Ledger degraded: {reason}")
        }
        RunEvent::Fatal { message } => format!("❌ Run crashed: {message}"),
    }
}

fn describe_lateness(minutes: i64) -> String {
    if minutes < 0 {
        format!("{} min early", -minutes)
    } else {
        format!("{minutes} min late")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn slot() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    #[test]
    fn published_mentions_slot_and_lateness() {
        let text = render(&RunEvent::Published {
            fingerprint: "abc".into(),
            scheduled_at: slot(),
            lateness_minutes: 5,
        });
        assert!(text.contains("2024-05-01 14:00"));
        assert!(text.contains("5 min late"));
    }

    #[test]
    fn early_publication_reads_as_early() {
        let text = render(&RunEvent::Published {
            fingerprint: "abc".into(),
            scheduled_at: slot(),
            lateness_minutes: -3,
        });
        assert!(text.contains("3 min early"));
    }

    #[test]
    fn summary_carries_both_counts() {
        let text = render(&RunEvent::DailySummary {
            date: slot().date(),
            planned: 4,
            published: 3,
        });
        assert!(text.contains("2024-05-01"));
        assert!(text.contains("Planned today: 4"));
        assert!(text.contains("Actually published: 3"));
    }

    #[test]
    fn failure_includes_the_error() {
        let text = render(&RunEvent::PublicationFailed {
            scheduled_at: slot(),
            error: "connection reset".into(),
        });
        assert!(text.contains("connection reset"));
    }
}
