use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One inline URL button attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostButton {
    pub label: String,
    pub url: String,
}

/// One schedulable unit of content, as produced by the catalog loader.
///
/// `scheduled_at` is operator-local wall time — the catalog carries no zone
/// information, so the process-local zone is the interpretation everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// `None` when the source row has no parseable date or time. Such rows
    /// are kept so diagnostics can count them, but they never become due.
    pub scheduled_at: Option<NaiveDateTime>,
    /// Normalized message body. Empty means the row is malformed.
    pub text: String,
    pub photo_url: Option<String>,
    pub video_url: Option<String>,
    pub buttons: Vec<PostButton>,
}

impl Post {
    /// A row is publishable only when date, time and body are all present.
    pub fn is_well_formed(&self) -> bool {
        self.scheduled_at.is_some() && !self.text.trim().is_empty()
    }
}

/// Scheduling knobs for a single run. All externally configured — the
/// `[schedule]` section of `courier.toml` deserializes straight into this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPolicy {
    /// How far into the past a missed post is still honored, in minutes.
    #[serde(default = "default_lookback")]
    pub lookback_minutes: i64,
    /// How far into the future an early trigger may reach, in minutes.
    #[serde(default = "default_lookahead")]
    pub lookahead_minutes: i64,
    /// Hard cap on publications per invocation.
    #[serde(default = "default_max_per_run")]
    pub max_per_run: usize,
    /// Minimum spacing between any two successful publications, in minutes.
    #[serde(default = "default_anti_duplicate")]
    pub anti_duplicate_minutes: i64,
    /// Local hour (0–23) after which the daily summary may fire.
    #[serde(default = "default_report_hour")]
    pub report_hour: u32,
    /// Mandatory pause between two publishes inside one run.
    #[serde(default = "default_inter_post_delay")]
    pub inter_post_delay_ms: u64,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            lookback_minutes: default_lookback(),
            lookahead_minutes: default_lookahead(),
            max_per_run: default_max_per_run(),
            anti_duplicate_minutes: default_anti_duplicate(),
            report_hour: default_report_hour(),
            inter_post_delay_ms: default_inter_post_delay(),
        }
    }
}

fn default_lookback() -> i64 {
    10
}
fn default_lookahead() -> i64 {
    30
}
fn default_max_per_run() -> usize {
    1
}
fn default_anti_duplicate() -> i64 {
    15
}
fn default_report_hour() -> u32 {
    21
}
fn default_inter_post_delay() -> u64 {
    600
}
