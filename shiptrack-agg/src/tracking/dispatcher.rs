//! Dispatcher / aggregator
//!
//! The dispatcher never fails the caller: every adapter-level failure
//! (missing credential, upstream error, timeout, unclassifiable identifier)
//! is logged and converted into a fallback result. The one exception is an
//! explicit provider hint naming an unknown provider, which is a caller
//! programming error and does propagate.

use std::sync::Arc;

use shiptrack_common::{Modality, NormalizedTrackingResult};
use tracing::{debug, warn};

use crate::db::EventStore;
use crate::providers::{AisClient, AviationstackClient, CarrierAdapter, TrackError};
use crate::registry::ProviderRegistry;
use crate::tracking::fallback::{generate_fallback, FallbackReason};
use crate::tracking::unified::detect_modality;

/// Aggregates the provider registry, the modality adapters and the event
/// store behind the tracking entry points
pub struct Tracker {
    registry: ProviderRegistry,
    aviation: Arc<dyn CarrierAdapter>,
    maritime: Arc<dyn CarrierAdapter>,
    store: EventStore,
}

impl Tracker {
    pub fn new(
        registry: ProviderRegistry,
        aviation: Arc<dyn CarrierAdapter>,
        maritime: Arc<dyn CarrierAdapter>,
        store: EventStore,
    ) -> Self {
        Self {
            registry,
            aviation,
            maritime,
            store,
        }
    }

    /// Build a tracker with the standard registry and modality adapters
    pub fn from_credentials(
        credentials: &shiptrack_common::config::ResolvedCredentials,
        store: EventStore,
    ) -> shiptrack_common::Result<Self> {
        Ok(Self::new(
            ProviderRegistry::standard(credentials)?,
            Arc::new(AviationstackClient::new(credentials.aviationstack.clone())?),
            Arc::new(AisClient::new(credentials.ais.clone())?),
            store,
        ))
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Track through the ground/ocean registry
    ///
    /// Total over identifier strings when no hint is given. With a hint,
    /// the only possible error is [`TrackError::UnknownProviderHint`].
    pub async fn track_shipment(
        &self,
        identifier: &str,
        provider_hint: Option<&str>,
    ) -> Result<NormalizedTrackingResult, TrackError> {
        match provider_hint {
            Some(hint) => {
                let adapter = self
                    .registry
                    .by_name(hint)
                    .ok_or_else(|| TrackError::UnknownProviderHint(hint.to_string()))?;
                let result = self.track_with_adapter(adapter.as_ref(), identifier).await;
                self.persist(&result).await;
                Ok(result)
            }
            None => Ok(self.track_ground(identifier).await),
        }
    }

    /// Classify and track through the ground registry; fallback when no
    /// pattern matches
    async fn track_ground(&self, identifier: &str) -> NormalizedTrackingResult {
        let result = match self.registry.classify(identifier) {
            Some(adapter) => self.track_with_adapter(adapter.as_ref(), identifier).await,
            None => {
                debug!(
                    identifier,
                    "No provider pattern matched; returning fallback result"
                );
                generate_fallback(identifier, FallbackReason::UnrecognizedIdentifier)
            }
        };
        self.persist(&result).await;
        result
    }

    /// Track a flight number through the aviation adapter
    pub async fn track_flight(&self, identifier: &str) -> NormalizedTrackingResult {
        let result = self
            .track_with_adapter(self.aviation.as_ref(), identifier)
            .await;
        self.persist(&result).await;
        result
    }

    /// Track a vessel position by MMSI through the maritime adapter
    pub async fn track_vessel(&self, identifier: &str) -> NormalizedTrackingResult {
        let result = self
            .track_with_adapter(self.maritime.as_ref(), identifier)
            .await;
        self.persist(&result).await;
        result
    }

    /// Cross-modal entry point
    ///
    /// With [`Modality::Auto`] the identifier's shape picks the path:
    /// flight-number shapes first, then MMSI, then ground as the default.
    /// Never fails the caller.
    pub async fn track_unified(
        &self,
        identifier: &str,
        modality: Modality,
    ) -> NormalizedTrackingResult {
        let resolved = match modality {
            Modality::Auto => detect_modality(identifier),
            explicit => explicit,
        };

        debug!(identifier, modality = %resolved, "Routing unified tracking request");

        match resolved {
            Modality::Aviation => self.track_flight(identifier).await,
            Modality::Maritime => self.track_vessel(identifier).await,
            // detect_modality never yields Auto; treat it as ground anyway
            Modality::Ground | Modality::Auto => self.track_ground(identifier).await,
        }
    }

    /// Invoke one adapter; convert any failure into a fallback result
    async fn track_with_adapter(
        &self,
        adapter: &dyn CarrierAdapter,
        identifier: &str,
    ) -> NormalizedTrackingResult {
        match adapter.track(identifier).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    provider = adapter.name(),
                    identifier,
                    error = %err,
                    "Adapter call failed; returning fallback result"
                );
                generate_fallback(identifier, fallback_reason(adapter.name(), err))
            }
        }
    }

    /// Append the result's events to the store
    ///
    /// Persistence is a side effect: failures are logged and swallowed so
    /// they never affect the returned tracking result.
    async fn persist(&self, result: &NormalizedTrackingResult) {
        for event in &result.events {
            if let Err(e) = self
                .store
                .append(&result.tracking_number, &result.provider, event)
                .await
            {
                warn!(
                    tracking_number = %result.tracking_number,
                    provider = %result.provider,
                    error = %e,
                    "Failed to persist tracking event"
                );
            }
        }
    }
}

/// Map an adapter failure to the matching fallback reason
fn fallback_reason(provider: &str, err: TrackError) -> FallbackReason {
    match err {
        TrackError::ProviderUnavailable(provider) => FallbackReason::MissingCredential { provider },
        TrackError::Upstream { provider, detail } => {
            FallbackReason::UpstreamFailure { provider, detail }
        }
        // Not produced by adapters; attribute to the provider we called
        TrackError::UnknownProviderHint(_) | TrackError::ClassificationFailed => {
            FallbackReason::UpstreamFailure {
                provider: provider.to_string(),
                detail: err.to_string(),
            }
        }
    }
}
