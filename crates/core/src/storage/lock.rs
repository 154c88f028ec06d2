use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, Postgres};

// Advisory locks are scoped to the Postgres session. Held for the duration of one watchlist
// refresh so two workers never run overlapping cycles.
const REFRESH_LOCK_KEY: i64 = 0x4149_5452_4144; // "AITRAD"

/// A held refresh lock. Owns the pooled connection the lock was taken on, so the unlock runs
/// on the same session.
pub struct RefreshLock {
    conn: PoolConnection<Postgres>,
}

/// `None` when another session holds the lock.
pub async fn try_acquire_refresh_lock(pool: &sqlx::PgPool) -> anyhow::Result<Option<RefreshLock>> {
    let mut conn = pool
        .acquire()
        .await
        .context("failed to acquire connection for advisory lock")?;

    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(REFRESH_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={REFRESH_LOCK_KEY})"))?;

    Ok(acquired.0.then_some(RefreshLock { conn }))
}

impl RefreshLock {
    /// Returns whether Postgres reported the lock as held by this session. When the unlock
    /// fails or reports false, the connection is closed instead of returned to the pool so the
    /// session cannot keep the lock.
    pub async fn release(mut self) -> anyhow::Result<bool> {
        let released = sqlx::query_as::<_, (bool,)>("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(REFRESH_LOCK_KEY)
            .fetch_one(&mut *self.conn)
            .await;

        match released {
            Ok((true,)) => Ok(true),
            Ok((false,)) => {
                tracing::warn!(key = REFRESH_LOCK_KEY, "advisory unlock reported lock not held");
                close_session(self.conn).await;
                Ok(false)
            }
            Err(err) => {
                close_session(self.conn).await;
                Err(err).with_context(|| {
                    format!("failed to release advisory lock (key={REFRESH_LOCK_KEY})")
                })
            }
        }
    }
}

async fn close_session(conn: PoolConnection<Postgres>) {
    if let Err(err) = conn.detach().close().await {
        tracing::warn!(error = %err, "failed to close advisory lock session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Runs only when DATABASE_URL points at a disposable Postgres.
    #[tokio::test]
    async fn lock_is_exclusive_and_released_on_its_own_session() {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            return;
        };
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .unwrap();

        let held = try_acquire_refresh_lock(&pool).await.unwrap().unwrap();
        // Churn the pool so other sessions are checked out in between.
        for _ in 0..4 {
            let _ = sqlx::query("SELECT 1").execute(&pool).await.unwrap();
        }
        assert!(try_acquire_refresh_lock(&pool).await.unwrap().is_none());

        assert!(held.release().await.unwrap());

        let again = try_acquire_refresh_lock(&pool).await.unwrap().unwrap();
        assert!(again.release().await.unwrap());
    }
}
