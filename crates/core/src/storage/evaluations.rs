use crate::domain::recommendation::Evaluation;
use crate::watchlist::{WatchlistEntry, WatchlistSnapshot};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Runs kept by `persist_snapshot` when the caller does not choose a limit.
pub const DEFAULT_RETAINED_RUNS: usize = 2_000;

#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub run_id: Uuid,
    pub as_of_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub snapshot: WatchlistSnapshot,
}

/// Score columns queried without unpacking the JSONB detail. All `None` for an unavailable
/// ticker.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct EntryColumns {
    decision: Option<&'static str>,
    ensemble_score: Option<i32>,
    momentum_score: Option<i32>,
    sentiment_score: Option<i32>,
    swing_score: Option<f64>,
    stop_loss_percent: Option<f64>,
    take_profit_percent: Option<f64>,
}

impl EntryColumns {
    fn from_evaluation(evaluation: &Evaluation) -> Self {
        match evaluation.recommendation() {
            Some(rec) => Self {
                decision: Some(rec.decision.as_str()),
                ensemble_score: Some(rec.scores.ensemble_score),
                momentum_score: Some(rec.scores.momentum_score),
                sentiment_score: Some(rec.scores.sentiment_score),
                swing_score: rec.scores.swing_score,
                stop_loss_percent: Some(rec.risk.stop_loss_percent),
                take_profit_percent: Some(rec.risk.take_profit_percent),
            },
            None => Self::default(),
        }
    }
}

/// At least the run just written is always kept.
fn retention_limit(retain_runs: usize) -> i64 {
    i64::try_from(retain_runs.max(1)).unwrap_or(i64::MAX)
}

/// Writes the run and its entries, then prunes all but the newest `retain_runs` runs, in one
/// transaction. Entries of pruned runs go with them via `ON DELETE CASCADE`.
pub async fn persist_snapshot(
    pool: &sqlx::PgPool,
    as_of_date: NaiveDate,
    generated_at: DateTime<Utc>,
    snapshot: &WatchlistSnapshot,
    retain_runs: usize,
) -> anyhow::Result<Uuid> {
    let run_id = Uuid::new_v4();
    let summary = snapshot.summary();

    let mut tx = pool.begin().await.context("begin transaction failed")?;

    sqlx::query(
        "INSERT INTO evaluation_runs \
         (id, as_of_date, generated_at, ticker_count, buy_count, hold_count, avoid_count, unavailable_count) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .persistent(false)
    .bind(run_id)
    .bind(as_of_date)
    .bind(generated_at)
    .bind(snapshot.len() as i32)
    .bind(summary.buy as i32)
    .bind(summary.hold as i32)
    .bind(summary.avoid as i32)
    .bind(summary.unavailable as i32)
    .execute(&mut *tx)
    .await
    .context("insert evaluation_runs failed")?;

    for (position, entry) in snapshot.entries.iter().enumerate() {
        insert_entry(&mut tx, run_id, position as i32, entry).await?;
    }

    let pruned = sqlx::query(
        "DELETE FROM evaluation_runs \
         WHERE id NOT IN ( \
             SELECT id FROM evaluation_runs ORDER BY generated_at DESC, id LIMIT $1 \
         )",
    )
    .persistent(false)
    .bind(retention_limit(retain_runs))
    .execute(&mut *tx)
    .await
    .context("prune evaluation_runs failed")?
    .rows_affected();

    tx.commit().await.context("commit transaction failed")?;

    if pruned > 0 {
        tracing::debug!(pruned, retain_runs, "pruned old evaluation runs");
    }
    Ok(run_id)
}

async fn insert_entry(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    run_id: Uuid,
    position: i32,
    entry: &WatchlistEntry,
) -> anyhow::Result<()> {
    let evaluation = serde_json::to_value(&entry.evaluation)
        .with_context(|| format!("serialize evaluation for {} failed", entry.ticker))?;
    let columns = EntryColumns::from_evaluation(&entry.evaluation);

    sqlx::query(
        "INSERT INTO evaluation_entries \
         (run_id, position, ticker, status, evaluated_at, evaluation, \
          decision, ensemble_score, momentum_score, sentiment_score, swing_score, \
          stop_loss_percent, take_profit_percent) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .persistent(false)
    .bind(run_id)
    .bind(position)
    .bind(&entry.ticker)
    .bind(entry.evaluation.status_label())
    .bind(entry.evaluated_at)
    .bind(evaluation)
    .bind(columns.decision)
    .bind(columns.ensemble_score)
    .bind(columns.momentum_score)
    .bind(columns.sentiment_score)
    .bind(columns.swing_score)
    .bind(columns.stop_loss_percent)
    .bind(columns.take_profit_percent)
    .execute(&mut **tx)
    .await
    .context("insert evaluation_entries failed")?;

    Ok(())
}

pub async fn fetch_latest_snapshot(pool: &sqlx::PgPool) -> anyhow::Result<Option<StoredSnapshot>> {
    let row = sqlx::query_as::<_, (Uuid, NaiveDate, DateTime<Utc>)>(
        "SELECT id, as_of_date, generated_at \
         FROM evaluation_runs \
         ORDER BY generated_at DESC \
         LIMIT 1",
    )
    .persistent(false)
    .fetch_optional(pool)
    .await
    .context("select latest evaluation_runs failed")?;

    let Some((run_id, as_of_date, generated_at)) = row else {
        return Ok(None);
    };

    let rows = sqlx::query_as::<_, (String, DateTime<Utc>, serde_json::Value)>(
        "SELECT ticker, evaluated_at, evaluation \
         FROM evaluation_entries \
         WHERE run_id = $1 \
         ORDER BY position ASC",
    )
    .persistent(false)
    .bind(run_id)
    .fetch_all(pool)
    .await
    .context("select evaluation_entries failed")?;

    let mut entries = Vec::with_capacity(rows.len());
    for (ticker, evaluated_at, evaluation) in rows {
        let evaluation = serde_json::from_value::<Evaluation>(evaluation).with_context(|| {
            format!("invalid evaluation JSON in DB for run_id={run_id}, ticker={ticker}")
        })?;
        entries.push(WatchlistEntry {
            ticker,
            evaluation,
            evaluated_at,
        });
    }

    Ok(Some(StoredSnapshot {
        run_id,
        as_of_date,
        generated_at,
        snapshot: WatchlistSnapshot { entries },
    }))
}
