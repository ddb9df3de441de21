//! Provider abstraction for the two downstream email services.
//!
//! Both providers implement an identical request protocol; only the `send`
//! payload shapes and base configuration differ. The [`EmailApi`] trait is
//! the seam the dispatch layer consumes.

mod client;
mod types;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::http::ApiError;

pub use client::ProviderClient;
pub use types::{
    BroadcastSend, EmailState, GlobalStatus, LeadState, SendRequest, SendResponse, SequenceStep,
    StatsFilters, StatsFlat, StatsGroup, StatsGrouped, StatsPayload, StatsResult, StatusItem,
    StatusQuery, StatusResult, StatusScope, StepStats, SuppressionState, TransactionalSend,
};

/// Which downstream provider handles a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// One-to-one, triggered emails.
    Transactional,
    /// Campaign/sequence emails to many leads.
    Broadcast,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Transactional => write!(f, "transactional"),
            ProviderKind::Broadcast => write!(f, "broadcast"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "transactional" => Ok(ProviderKind::Transactional),
            "broadcast" => Ok(ProviderKind::Broadcast),
            _ => anyhow::bail!(
                "Unknown provider kind: {}. Expected transactional or broadcast.",
                s
            ),
        }
    }
}

/// Operations every downstream provider exposes.
///
/// `send` is the only operation the idempotency layer guards; the rest are
/// read-only or relays and pass straight through.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailApi: Send + Sync {
    /// The provider this client talks to.
    fn kind(&self) -> ProviderKind;

    /// Submits one email (or one lead into a sequence, for broadcast).
    async fn send(&self, request: &SendRequest) -> Result<SendResponse, ApiError>;

    /// Fetches aggregate statistics, flat or grouped depending on `filters`.
    async fn get_stats(&self, filters: &StatsFilters) -> Result<StatsResult, ApiError>;

    /// Fetches per-recipient contact/delivery/suppression state.
    async fn get_status(&self, query: &StatusQuery) -> Result<Vec<StatusResult>, ApiError>;

    /// Relays an inbound webhook body to the provider unchanged.
    async fn forward_webhook(&self, body: &serde_json::Value)
    -> Result<serde_json::Value, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(
            "transactional".parse::<ProviderKind>().unwrap(),
            ProviderKind::Transactional
        );
        assert_eq!(
            "Transactional".parse::<ProviderKind>().unwrap(),
            ProviderKind::Transactional
        );
        assert_eq!(
            "broadcast".parse::<ProviderKind>().unwrap(),
            ProviderKind::Broadcast
        );
        assert!("bulk".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_display() {
        assert_eq!(ProviderKind::Transactional.to_string(), "transactional");
        assert_eq!(ProviderKind::Broadcast.to_string(), "broadcast");
    }
}
