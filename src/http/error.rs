//! Typed classification of provider call failures.
//!
//! The outcome of every HTTP call is classified exactly once, at the point
//! the call result is first observed. Retry decisions are made on the typed
//! classification, never by inspecting formatted error text.

use reqwest::{Method, StatusCode};
use std::fmt;

use crate::provider::ProviderKind;

/// How a single provider call failed.
#[derive(Debug)]
pub enum FailureKind {
    /// No HTTP response was obtained (connection error, timeout, DNS).
    /// The only retryable failure.
    Network { source: reqwest::Error, url: String },
    /// The provider answered with a non-2xx status. Never retried; carries
    /// the status and response body verbatim.
    Provider { status: StatusCode, body: String },
    /// A success-status response whose body did not match the expected
    /// result shape. Not retried.
    Decode(reqwest::Error),
}

/// A classified provider call failure, annotated with the provider and the
/// request it belongs to.
#[derive(Debug)]
pub struct ApiError {
    pub provider: ProviderKind,
    pub method: Method,
    pub path: String,
    pub kind: FailureKind,
}

impl ApiError {
    /// True for network-level failures, the only kind the client retries.
    pub fn is_network(&self) -> bool {
        matches!(self.kind, FailureKind::Network { .. })
    }

    /// The HTTP status reported by the provider, if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.kind {
            FailureKind::Provider { status, .. } => Some(*status),
            FailureKind::Network { .. } | FailureKind::Decode(_) => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: ", self.provider, self.method, self.path)?;
        match &self.kind {
            FailureKind::Network { source, url } => {
                write!(f, "{} (url: {})", source, url)
            }
            FailureKind::Provider { status, body } => {
                write!(f, "{} - {}", status.as_u16(), body)
            }
            FailureKind::Decode(source) => {
                write!(f, "failed to decode response: {}", source)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            FailureKind::Network { source, .. } => Some(source),
            FailureKind::Decode(source) => Some(source),
            FailureKind::Provider { .. } => None,
        }
    }
}
