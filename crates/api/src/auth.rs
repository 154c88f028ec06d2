use axum::http::HeaderMap;
use std::collections::HashSet;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: Option<String>,
}

impl Credentials {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let api_key = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self { api_key }
    }
}

/// Decides whether a caller may edit the watchlist. Injected into the router state.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credentials: &Credentials) -> bool;
}

/// Accepts any key from a fixed set. An empty set rejects everything.
#[derive(Debug, Clone, Default)]
pub struct StaticApiKeys {
    keys: HashSet<String>,
}

impl StaticApiKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl CredentialVerifier for StaticApiKeys {
    fn verify(&self, credentials: &Credentials) -> bool {
        credentials
            .api_key
            .as_ref()
            .is_some_and(|key| self.keys.contains(key))
    }
}
