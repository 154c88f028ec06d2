pub mod analytics;
pub mod decision;
pub mod domain;
pub mod earnings;
pub mod engine;
pub mod ingest;
pub mod risk;
pub mod scoring;
pub mod sentiment;
pub mod storage;
pub mod time;
pub mod watchlist;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub price_provider_base_url: Option<String>,
        pub price_provider_api_key: Option<String>,
        pub api_keys: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                price_provider_base_url: std::env::var("PRICE_PROVIDER_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                price_provider_api_key: std::env::var("PRICE_PROVIDER_API_KEY").ok(),
                api_keys: std::env::var("API_KEYS").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_price_provider_base_url(&self) -> anyhow::Result<&str> {
            self.price_provider_base_url
                .as_deref()
                .context("PRICE_PROVIDER_BASE_URL is required")
        }

        /// Comma-separated `API_KEYS`, trimmed, empty entries dropped.
        pub fn api_key_list(&self) -> Vec<String> {
            self.api_keys
                .as_deref()
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        }
    }
}
