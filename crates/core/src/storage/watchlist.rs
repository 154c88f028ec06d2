use crate::watchlist::{normalize_ticker, Watchlist};
use anyhow::Context;

pub async fn load_watchlist(pool: &sqlx::PgPool) -> anyhow::Result<Watchlist> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT ticker FROM watchlist_tickers ORDER BY added_at ASC, ticker ASC")
            .persistent(false)
            .fetch_all(pool)
            .await
            .context("select watchlist_tickers failed")?;

    Ok(rows.into_iter().map(|(ticker,)| ticker).collect())
}

/// Returns false when the ticker was already present.
pub async fn add_ticker(pool: &sqlx::PgPool, raw: &str) -> anyhow::Result<bool> {
    let ticker = normalize_ticker(raw).with_context(|| format!("invalid ticker: {raw:?}"))?;
    let res = sqlx::query(
        "INSERT INTO watchlist_tickers (ticker) VALUES ($1) ON CONFLICT (ticker) DO NOTHING",
    )
    .persistent(false)
    .bind(&ticker)
    .execute(pool)
    .await
    .context("insert watchlist_tickers failed")?;
    Ok(res.rows_affected() == 1)
}

pub async fn remove_ticker(pool: &sqlx::PgPool, raw: &str) -> anyhow::Result<bool> {
    let ticker = normalize_ticker(raw).with_context(|| format!("invalid ticker: {raw:?}"))?;
    let res = sqlx::query("DELETE FROM watchlist_tickers WHERE ticker = $1")
        .persistent(false)
        .bind(&ticker)
        .execute(pool)
        .await
        .context("delete watchlist_tickers failed")?;
    Ok(res.rows_affected() == 1)
}

pub async fn clear_watchlist(pool: &sqlx::PgPool) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM watchlist_tickers")
        .persistent(false)
        .execute(pool)
        .await
        .context("clear watchlist_tickers failed")?;
    Ok(res.rows_affected())
}
