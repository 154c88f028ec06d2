use aitrader_core::engine::Engine;
use aitrader_core::watchlist::{Watchlist, WatchlistSnapshot};
use anyhow::Context;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod report;

#[derive(Debug, Parser)]
#[command(name = "aitrader_worker")]
struct Args {
    /// Comma-separated tickers. Overrides the stored watchlist.
    #[arg(long)]
    tickers: Option<String>,

    /// Re-run every N seconds. Runs a single cycle when omitted.
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Label for persisted snapshots (YYYY-MM-DD). Defaults to the last completed session.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Evaluate and log the table without touching the database.
    #[arg(long)]
    dry_run: bool,

    /// Persisted runs to keep; older runs are pruned after each cycle.
    #[arg(long, default_value_t = aitrader_core::storage::evaluations::DEFAULT_RETAINED_RUNS)]
    retain_runs: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = aitrader_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    if matches!(args.interval_secs, Some(0)) {
        anyhow::bail!("--interval-secs must be at least 1");
    }

    let engine = Engine::from_settings(&settings)?;

    let pool = if args.dry_run {
        None
    } else {
        let db_url = settings.require_database_url()?;
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .context("connect DATABASE_URL failed")?;
        aitrader_core::storage::migrate(&pool).await?;
        Some(pool)
    };

    let Some(interval_secs) = args.interval_secs else {
        return run_cycle(&engine, pool.as_ref(), &args).await;
    };

    // Cycles run back to back on one task, so a slow cycle delays the next instead of
    // overlapping it.
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(err) = run_cycle(&engine, pool.as_ref(), &args).await {
                    sentry_anyhow::capture_anyhow(&err);
                    tracing::error!(error = %err, "refresh cycle failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                return Ok(());
            }
        }
    }
}

async fn run_cycle(engine: &Engine, pool: Option<&sqlx::PgPool>, args: &Args) -> anyhow::Result<()> {
    let holidays = aitrader_core::time::calendar::configured_holidays();
    let now = chrono::Utc::now();
    let as_of_date =
        aitrader_core::time::calendar::resolve_as_of_date(args.as_of_date.as_deref(), now, &holidays)?;

    let Some(pool) = pool else {
        let watchlist = Watchlist::parse(args.tickers.as_deref().unwrap_or_default());
        let snapshot = evaluate(engine, &watchlist).await;
        tracing::info!(%as_of_date, dry_run = true, "refresh cycle complete (dry-run)");
        report::log_table(&snapshot);
        return Ok(());
    };

    let Some(lock) = aitrader_core::storage::lock::try_acquire_refresh_lock(pool).await? else {
        tracing::warn!(%as_of_date, "refresh lock not acquired; another cycle in progress");
        return Ok(());
    };

    let result = persist_cycle(engine, pool, args, as_of_date).await;

    match lock.release().await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("refresh lock was not held at release"),
        Err(err) => tracing::warn!(error = %err, "failed to release refresh lock"),
    }
    result
}

async fn persist_cycle(
    engine: &Engine,
    pool: &sqlx::PgPool,
    args: &Args,
    as_of_date: chrono::NaiveDate,
) -> anyhow::Result<()> {
    let watchlist = match args.tickers.as_deref() {
        Some(tickers) => Watchlist::parse(tickers),
        None => aitrader_core::storage::watchlist::load_watchlist(pool).await?,
    };

    let generated_at = chrono::Utc::now();
    let snapshot = evaluate(engine, &watchlist).await;

    let run_id = aitrader_core::storage::evaluations::persist_snapshot(
        pool,
        as_of_date,
        generated_at,
        &snapshot,
        args.retain_runs,
    )
    .await?;

    tracing::info!(%as_of_date, %run_id, tickers = snapshot.len(), "persisted watchlist snapshot");
    report::log_table(&snapshot);
    Ok(())
}

async fn evaluate(engine: &Engine, watchlist: &Watchlist) -> WatchlistSnapshot {
    if watchlist.is_empty() {
        tracing::warn!("watchlist is empty; nothing to evaluate");
        return WatchlistSnapshot::default();
    }
    engine.evaluate_all(watchlist.tickers()).await
}

fn init_sentry(settings: &aitrader_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
