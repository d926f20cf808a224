//! `courier` — scheduled channel publisher, one invocation per run.
//!
//! Designed for a cron-style trigger every few minutes: load the catalog and
//! the ledger, publish whatever is due, report, exit. All memory between
//! runs lives in the ledger.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use clap::Parser;
use tracing::info;

use courier_core::{CourierConfig, Post, RunEvent};
use courier_engine::{Notifier, Receipt, Transport, TransportError};
use courier_ledger::PublicationLedger;

#[derive(Parser, Debug)]
#[command(name = "courier", version, about = "Publish scheduled posts to a channel")]
struct Args {
    /// Path to courier.toml (default: ./courier.toml, or COURIER_CONFIG).
    #[arg(long)]
    config: Option<String>,

    /// Override the catalog CSV path from config.
    #[arg(long)]
    catalog: Option<String>,

    /// Override the ledger path from config.
    #[arg(long)]
    ledger: Option<String>,

    /// Freeze the clock for this run: "YYYY-MM-DD HH:MM" local time.
    #[arg(long)]
    now: Option<String>,

    /// Log what would be published without sending anything. Runs against a
    /// scratch copy of the ledger, so nothing is recorded.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "courier=info,courier_engine=info,courier_ledger=info,\
                     courier_catalog=info,courier_telegram=info"
                        .into()
                }),
        )
        .init();

    let args = Args::parse();

    // config: explicit flag > COURIER_CONFIG env > ./courier.toml
    let config_path = args
        .config
        .clone()
        .or_else(|| std::env::var("COURIER_CONFIG").ok());
    let mut config = CourierConfig::load(config_path.as_deref())?;
    if let Some(path) = &args.catalog {
        config.catalog.path = path.clone();
    }
    if let Some(path) = &args.ledger {
        config.ledger.path = path.clone();
    }

    let now = match &args.now {
        Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .map_err(|e| anyhow::anyhow!("bad --now value {s:?}: {e}"))?,
        None => Local::now().naive_local(),
    };

    let (transport, notifier): (Box<dyn Transport>, Box<dyn Notifier>) = if args.dry_run {
        (Box::new(DryRunTransport), Box::new(LogNotifier))
    } else {
        let Some(telegram) = &config.telegram else {
            anyhow::bail!("no [telegram] section configured; use --dry-run to test without one");
        };
        let (transport, notifier) = courier_telegram::connect(telegram, config.notify.mode);
        (Box::new(transport), Box::new(notifier))
    };

    match execute(&args, &config, now, transport.as_ref(), notifier.as_ref()).await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Per-post failures never land here; this is the abort path.
            notifier
                .emit(&RunEvent::Fatal {
                    message: e.to_string(),
                })
                .await;
            Err(e)
        }
    }
}

async fn execute(
    args: &Args,
    config: &CourierConfig,
    now: NaiveDateTime,
    transport: &dyn Transport,
    notifier: &dyn Notifier,
) -> anyhow::Result<()> {
    let ledger_path = resolve_ledger_path(args.dry_run, &config.ledger.path)?;
    ensure_parent_dir(&ledger_path);

    let (ledger, degraded) = PublicationLedger::open_or_recover(&ledger_path)?;
    if let Some(reason) = degraded {
        notifier.emit(&RunEvent::LedgerDegraded { reason }).await;
    }

    let posts = courier_catalog::load(Path::new(&config.catalog.path))?;
    info!(
        catalog = %config.catalog.path,
        posts = posts.len(),
        %now,
        dry_run = args.dry_run,
        "starting run"
    );

    let report =
        courier_engine::run(now, &posts, &ledger, transport, notifier, &config.schedule).await?;

    // One JSON line per invocation — what cron wrappers scrape.
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

/// For a dry run, work on a scratch copy so the real ledger is never
/// touched — the engine records publishes as part of its normal flow.
fn resolve_ledger_path(dry_run: bool, configured: &str) -> anyhow::Result<PathBuf> {
    if !dry_run {
        return Ok(PathBuf::from(configured));
    }
    let scratch = std::env::temp_dir().join(format!("courier-dryrun-{}.db", std::process::id()));
    // WAL sidecars carry recent commits, so copy them alongside the main file.
    for suffix in ["", "-wal", "-shm"] {
        let src = format!("{configured}{suffix}");
        let dst = format!("{}{suffix}", scratch.display());
        let _ = std::fs::remove_file(&dst);
        if Path::new(&src).exists() {
            std::fs::copy(&src, &dst)?;
        }
    }
    info!(scratch = %scratch.display(), "dry run: using scratch ledger copy");
    Ok(scratch)
}

fn ensure_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

/// Transport for `--dry-run`: logs instead of sending.
struct DryRunTransport;

#[async_trait::async_trait]
impl Transport for DryRunTransport {
    async fn publish(&self, post: &Post) -> Result<Receipt, TransportError> {
        let preview: String = post.text.chars().take(60).collect();
        info!(
            scheduled_at = ?post.scheduled_at,
            text = %preview,
            photo = post.photo_url.is_some(),
            video = post.video_url.is_some(),
            buttons = post.buttons.len(),
            "dry run: would publish"
        );
        Ok(Receipt { message_id: None })
    }
}

/// Notifier for `--dry-run`: events go to the log only.
struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn emit(&self, event: &RunEvent) {
        info!(?event, "run event");
    }
}
