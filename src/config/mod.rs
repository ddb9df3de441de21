//! Gateway configuration: provider endpoints and credentials plus cache
//! policy, resolved once at startup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;

use crate::cache::MAX_SIZE;

/// Endpoint and credential for one downstream provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
}

/// Full gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub transactional: ProviderSettings,
    pub broadcast: ProviderSettings,
    /// Maximum number of idempotency cache entries.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Whether classified failures are cached under the idempotency key and
    /// replayed, or retried against the provider on the next attempt.
    #[serde(default)]
    pub cache_failures: bool,
}

fn default_cache_capacity() -> usize {
    MAX_SIZE
}

impl GatewayConfig {
    /// Resolves configuration from `MAILGATE_*` environment variables.
    ///
    /// Required: `MAILGATE_TRANSACTIONAL_URL`, `MAILGATE_TRANSACTIONAL_KEY`,
    /// `MAILGATE_BROADCAST_URL`, `MAILGATE_BROADCAST_KEY`.
    /// Optional: `MAILGATE_CACHE_CAPACITY`, `MAILGATE_CACHE_FAILURES`.
    pub fn from_env() -> Result<Self> {
        let transactional = ProviderSettings {
            base_url: require_env("MAILGATE_TRANSACTIONAL_URL")?,
            api_key: require_env("MAILGATE_TRANSACTIONAL_KEY")?,
        };
        let broadcast = ProviderSettings {
            base_url: require_env("MAILGATE_BROADCAST_URL")?,
            api_key: require_env("MAILGATE_BROADCAST_KEY")?,
        };

        let cache_capacity = match env::var("MAILGATE_CACHE_CAPACITY") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("Invalid MAILGATE_CACHE_CAPACITY: {}", value))?,
            Err(_) => MAX_SIZE,
        };
        let cache_failures = env::var("MAILGATE_CACHE_FAILURES")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            transactional,
            broadcast,
            cache_capacity,
            cache_failures,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{} must be set", name))
}
