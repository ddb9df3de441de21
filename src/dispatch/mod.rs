//! Dispatch router: selects the provider by message type, deduplicates send
//! requests by idempotency key, and maps classified failures to
//! caller-visible outcomes.

mod locks;

use anyhow::{Context, Result};
use log::{debug, warn};
use std::sync::Arc;

use crate::cache::IdempotencyCache;
use crate::config::GatewayConfig;
use crate::http::{ApiError, FailureKind};
use crate::provider::{
    EmailApi, ProviderClient, ProviderKind, SendRequest, SendResponse, StatsFilters, StatsResult,
    StatusQuery, StatusResult,
};
use locks::KeyedLocks;

/// Terminal result of a dispatch, returned to the caller and (for
/// definitive outcomes) stored in the idempotency cache.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub status_code: u16,
    pub response: SendResponse,
}

/// Routes send requests to the Transactional or Broadcast provider with
/// at-most-one provider-side send per idempotency key.
pub struct Dispatcher {
    transactional: Arc<dyn EmailApi>,
    broadcast: Arc<dyn EmailApi>,
    cache: IdempotencyCache,
    locks: KeyedLocks,
    cache_failures: bool,
}

impl Dispatcher {
    /// Builds both provider clients from configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("mailgate")
            .build()
            .context("Failed to build HTTP client")?;

        let transactional = ProviderClient::new(
            client.clone(),
            ProviderKind::Transactional,
            &config.transactional.base_url,
            &config.transactional.api_key,
        );
        let broadcast = ProviderClient::new(
            client,
            ProviderKind::Broadcast,
            &config.broadcast.base_url,
            &config.broadcast.api_key,
        );

        Ok(Self::from_providers(
            Arc::new(transactional),
            Arc::new(broadcast),
            IdempotencyCache::with_capacity(config.cache_capacity),
            config.cache_failures,
        ))
    }

    /// Assembles a dispatcher from already-built providers.
    pub fn from_providers(
        transactional: Arc<dyn EmailApi>,
        broadcast: Arc<dyn EmailApi>,
        cache: IdempotencyCache,
        cache_failures: bool,
    ) -> Self {
        Self {
            transactional,
            broadcast,
            cache,
            locks: KeyedLocks::new(),
            cache_failures,
        }
    }

    pub fn cache(&self) -> &IdempotencyCache {
        &self.cache
    }

    /// Dispatches one send request under an idempotency key.
    ///
    /// The key's lock is held across check-call-store, so concurrent
    /// dispatches with the same key result in one provider call; the later
    /// caller replays the stored outcome. A replayed outcome is exactly the
    /// previously stored pair.
    #[tracing::instrument(skip(self, request))]
    pub async fn dispatch_send(
        &self,
        idempotency_key: &str,
        request: SendRequest,
    ) -> DispatchOutcome {
        let lock = self.locks.lock_for(idempotency_key);
        let outcome = {
            let _guard = lock.lock().await;

            if let Some(entry) = self.cache.get(idempotency_key) {
                debug!("Idempotency hit for key {}", idempotency_key);
                DispatchOutcome {
                    status_code: entry.status_code,
                    response: entry.response,
                }
            } else {
                self.send_and_store(idempotency_key, &request).await
            }
        };
        self.locks.release(idempotency_key, lock);
        outcome
    }

    /// Calls the selected provider and stores the terminal outcome. Only
    /// definitive outcomes reach the cache; an attempt that never resolves
    /// leaves no entry behind.
    async fn send_and_store(&self, idempotency_key: &str, request: &SendRequest) -> DispatchOutcome {
        match self.provider(request.kind()).send(request).await {
            Ok(response) => {
                let outcome = DispatchOutcome {
                    status_code: 200,
                    response,
                };
                self.cache
                    .set(idempotency_key, outcome.status_code, outcome.response.clone());
                outcome
            }
            Err(err) => {
                warn!("Dispatch for key {} failed: {}", idempotency_key, err);
                let outcome = DispatchOutcome {
                    status_code: failure_status(&err),
                    response: SendResponse::failure(err.to_string()),
                };
                if self.cache_failures {
                    self.cache
                        .set(idempotency_key, outcome.status_code, outcome.response.clone());
                }
                outcome
            }
        }
    }

    /// Statistics pass-through for the selected provider.
    pub async fn get_stats(
        &self,
        kind: ProviderKind,
        filters: &StatsFilters,
    ) -> Result<StatsResult, ApiError> {
        self.provider(kind).get_stats(filters).await
    }

    /// Status pass-through for the selected provider.
    pub async fn get_status(
        &self,
        kind: ProviderKind,
        query: &StatusQuery,
    ) -> Result<Vec<StatusResult>, ApiError> {
        self.provider(kind).get_status(query).await
    }

    /// Webhook relay pass-through for the selected provider.
    pub async fn forward_webhook(
        &self,
        kind: ProviderKind,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.provider(kind).forward_webhook(body).await
    }

    fn provider(&self, kind: ProviderKind) -> &Arc<dyn EmailApi> {
        match kind {
            ProviderKind::Transactional => &self.transactional,
            ProviderKind::Broadcast => &self.broadcast,
        }
    }
}

/// Maps a classified failure to the caller-visible status code: upstream
/// rejections and undecodable responses are 502, exhausted network failures
/// are 504.
fn failure_status(err: &ApiError) -> u16 {
    match err.kind {
        FailureKind::Network { .. } => 504,
        FailureKind::Provider { .. } | FailureKind::Decode(_) => 502,
    }
}
