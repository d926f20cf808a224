use chrono::NaiveDateTime;
use courier_core::Post;
use serde::Serialize;

/// A post that should be published this run: temporally inside the window
/// and absent from the ledger. Transient — rebuilt from scratch every
/// invocation, never persisted.
#[derive(Debug, Clone)]
pub struct DueCandidate {
    pub post: Post,
    /// The post's slot, extracted so downstream code never re-unwraps it.
    pub scheduled_at: NaiveDateTime,
    pub fingerprint: String,
    /// `now - scheduled_at`; negative for early (lookahead) publication.
    pub lateness_minutes: i64,
}

/// Output of the due-set resolver for one invocation.
#[derive(Debug, Clone)]
pub struct DueSet {
    /// Eligible posts, earliest slot first, capped at `max_per_run`.
    pub candidates: Vec<DueCandidate>,
    /// Eligible posts before the per-run cap was applied.
    pub eligible_total: usize,
    /// Malformed rows skipped this run. Diagnostics only — such rows are
    /// filtered identically every run and never retried differently.
    pub invalid_count: usize,
}

/// Why a run published fewer posts than were due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The anti-duplicate interval gated publication.
    Cooldown,
    /// The per-run cap left due posts for the next invocation.
    MaxPerRun,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Cooldown => write!(f, "cooldown"),
            SkipReason::MaxPerRun => write!(f, "max_per_run"),
        }
    }
}

/// Aggregate outcome of one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Posts that were due (before the per-run cap).
    pub due_count: usize,
    /// Malformed catalog rows encountered.
    pub invalid_count: usize,
    pub published_count: usize,
    pub failed_count: usize,
    /// Set when due posts were deliberately left unpublished.
    pub skipped: Option<SkipReason>,
}
