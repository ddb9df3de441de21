//! HTTP layer: generic provider client with timeout, single-retry and typed
//! failure classification.

mod client;
mod error;

pub use client::{ApiClient, MAX_ATTEMPTS, RETRY_DELAY, TIMEOUT};
pub use error::{ApiError, FailureKind};
