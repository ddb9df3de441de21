//! Concrete provider client: one instance per downstream service, sharing
//! the generic request protocol from [`crate::http`].

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::types::{
    SendRequest, SendResponse, StatsFilters, StatsResult, StatusQuery, StatusResult,
};
use super::{EmailApi, ProviderKind};
use crate::http::{ApiClient, ApiError};

#[derive(Deserialize)]
struct StatusEnvelope {
    results: Vec<StatusResult>,
}

/// Client for one downstream provider, holding its base URL and credential.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    api: ApiClient,
    kind: ProviderKind,
}

impl ProviderClient {
    pub fn new(
        client: Client,
        kind: ProviderKind,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            api: ApiClient::new(client, kind, base_url, api_key),
            kind,
        }
    }

    /// Overrides the per-attempt timeout and retry backoff.
    pub fn with_timing(mut self, timeout: Duration, retry_delay: Duration) -> Self {
        self.api = self.api.with_timing(timeout, retry_delay);
        self
    }
}

#[async_trait]
impl EmailApi for ProviderClient {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    #[tracing::instrument(skip(self, request))]
    async fn send(&self, request: &SendRequest) -> Result<SendResponse, ApiError> {
        debug!("Submitting send to {} provider...", self.kind);
        self.api.post_json("/send", request).await
    }

    #[tracing::instrument(skip(self, filters))]
    async fn get_stats(&self, filters: &StatsFilters) -> Result<StatsResult, ApiError> {
        self.api.post_json("/stats", filters).await
    }

    #[tracing::instrument(skip(self, query))]
    async fn get_status(&self, query: &StatusQuery) -> Result<Vec<StatusResult>, ApiError> {
        let envelope: StatusEnvelope = self.api.post_json("/status", query).await?;
        Ok(envelope.results)
    }

    #[tracing::instrument(skip(self, body))]
    async fn forward_webhook(
        &self,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        self.api
            .post_json(&format!("/webhooks/{}", self.kind), body)
            .await
    }
}
