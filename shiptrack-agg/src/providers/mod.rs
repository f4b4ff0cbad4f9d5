//! Provider adapters
//!
//! One adapter per external tracking system. Each adapter is responsible
//! only for building the provider-specific request, performing one network
//! call, and mapping the response into the normalized result shape. Adapters
//! never retry, never cache, and never make cross-provider decisions.

pub mod ais;
pub mod aviationstack;
pub mod cma_cgm;
pub mod dhl;
pub mod maersk;
pub mod ups;

use async_trait::async_trait;
use regex::Regex;
use shiptrack_common::NormalizedTrackingResult;
use std::time::Duration;
use thiserror::Error;

pub use ais::AisClient;
pub use aviationstack::AviationstackClient;
pub use cma_cgm::CmaCgmClient;
pub use dhl::DhlClient;
pub use maersk::MaerskClient;
pub use ups::UpsClient;

const USER_AGENT: &str = "shiptrack/0.1.0 (https://github.com/shiptrack/shiptrack)";

/// Per-call request timeout; expiry surfaces as [`TrackError::Upstream`]
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Tracking call errors
///
/// Everything except `UnknownProviderHint` is caught at the dispatcher
/// boundary and converted into a fallback result.
#[derive(Debug, Error)]
pub enum TrackError {
    /// Provider has no configured credential
    #[error("Provider '{0}' has no configured credential")]
    ProviderUnavailable(String),

    /// Non-success response, network/timeout failure, or malformed payload
    #[error("Upstream error from '{provider}': {detail}")]
    Upstream { provider: String, detail: String },

    /// Caller explicitly named a provider that does not exist
    #[error("Unknown provider hint: {0}")]
    UnknownProviderHint(String),

    /// Identifier matched no registered provider pattern (internal signal)
    #[error("Identifier matched no registered provider")]
    ClassificationFailed,
}

impl TrackError {
    /// Shorthand for an upstream failure attributed to `provider`
    pub fn upstream(provider: &str, detail: impl Into<String>) -> Self {
        TrackError::Upstream {
            provider: provider.to_string(),
            detail: detail.into(),
        }
    }
}

/// Common capability of every provider adapter
///
/// Implementations are value objects: name, identifier-shape pattern, and a
/// single-attempt `track` call. The registry iterates them in registration
/// order, so `pattern` doubles as the classification predicate.
#[async_trait]
pub trait CarrierAdapter: Send + Sync {
    /// Stable lowercase provider name (also the hint/lookup key)
    fn name(&self) -> &'static str;

    /// Identifier shape this provider claims (matched against the
    /// trimmed, upper-cased identifier)
    fn pattern(&self) -> &Regex;

    /// Perform one upstream call and normalize the response
    async fn track(&self, identifier: &str) -> Result<NormalizedTrackingResult, TrackError>;
}

/// Build the shared-profile HTTP client used by all adapters
pub(crate) fn build_http_client() -> shiptrack_common::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| {
            shiptrack_common::Error::Internal(format!("Failed to build HTTP client: {}", e))
        })
}
