use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use aitrader_core::domain::recommendation::Evaluation;
use aitrader_core::engine::Engine;
use aitrader_core::watchlist::{normalize_ticker, SnapshotSummary, WatchlistSnapshot};

mod auth;

use auth::{CredentialVerifier, Credentials, StaticApiKeys};

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

    let engine = Arc::new(Engine::from_settings(&settings)?);

    let verifier = StaticApiKeys::new(settings.api_key_list());
    if verifier.is_empty() {
        tracing::warn!("API_KEYS not set; watchlist edits are disabled");
    }

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match aitrader_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        pool,
        engine,
        verifier: Arc::new(verifier),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/evaluate/:ticker", get(evaluate_ticker))
        .route("/watchlist", get(list_watchlist).delete(clear_watchlist))
        .route("/watchlist/snapshot/latest", get(get_latest_snapshot))
        .route(
            "/watchlist/:ticker",
            post(add_to_watchlist).delete(remove_from_watchlist),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    pool: Option<PgPool>,
    engine: Arc<Engine>,
    verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    fn db(&self) -> Result<&PgPool, StatusCode> {
        self.pool.as_ref().ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), StatusCode> {
        if self.verifier.verify(&Credentials::from_headers(headers)) {
            Ok(())
        } else {
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiEvaluation {
    ticker: String,
    evaluated_at: DateTime<Utc>,
    evaluation: Evaluation,
}

async fn evaluate_ticker(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> Result<Json<ApiEvaluation>, StatusCode> {
    let ticker = normalize_ticker(&ticker).ok_or(StatusCode::BAD_REQUEST)?;
    let evaluation = state.engine.evaluate(&ticker).await;
    Ok(Json(ApiEvaluation {
        ticker,
        evaluated_at: Utc::now(),
        evaluation,
    }))
}

#[derive(Debug, Serialize)]
struct ApiWatchlist {
    tickers: Vec<String>,
}

async fn list_watchlist(State(state): State<AppState>) -> Result<Json<ApiWatchlist>, StatusCode> {
    let pool = state.db()?;
    let watchlist = aitrader_core::storage::watchlist::load_watchlist(pool)
        .await
        .map_err(internal)?;
    Ok(Json(ApiWatchlist {
        tickers: watchlist.tickers().to_vec(),
    }))
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ticker): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state.authorize(&headers)?;
    let pool = state.db()?;
    let ticker = normalize_ticker(&ticker).ok_or(StatusCode::BAD_REQUEST)?;

    let added = aitrader_core::storage::watchlist::add_ticker(pool, &ticker)
        .await
        .map_err(internal)?;
    tracing::info!(%ticker, added, "watchlist add");
    Ok(if added {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    })
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(ticker): Path<String>,
) -> Result<StatusCode, StatusCode> {
    state.authorize(&headers)?;
    let pool = state.db()?;
    let ticker = normalize_ticker(&ticker).ok_or(StatusCode::BAD_REQUEST)?;

    let removed = aitrader_core::storage::watchlist::remove_ticker(pool, &ticker)
        .await
        .map_err(internal)?;
    tracing::info!(%ticker, removed, "watchlist remove");
    Ok(if removed {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}

async fn clear_watchlist(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    state.authorize(&headers)?;
    let pool = state.db()?;
    let removed = aitrader_core::storage::watchlist::clear_watchlist(pool)
        .await
        .map_err(internal)?;
    tracing::info!(removed, "watchlist cleared");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct ApiSnapshot {
    run_id: Uuid,
    as_of_date: NaiveDate,
    generated_at: DateTime<Utc>,
    summary: SnapshotSummary,
    snapshot: WatchlistSnapshot,
}

async fn get_latest_snapshot(
    State(state): State<AppState>,
) -> Result<Json<ApiSnapshot>, StatusCode> {
    let pool = state.db()?;

    let stored = aitrader_core::storage::evaluations::fetch_latest_snapshot(pool)
        .await
        .map_err(internal)?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ApiSnapshot {
        run_id: stored.run_id,
        as_of_date: stored.as_of_date,
        generated_at: stored.generated_at,
        summary: stored.snapshot.summary(),
        snapshot: stored.snapshot,
    }))
}

fn internal(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %e, "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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
