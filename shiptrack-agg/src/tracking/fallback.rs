//! Fallback/placeholder result synthesis
//!
//! When no live data can be obtained the dispatcher returns a synthetic
//! result from here instead of an error. The output is unmistakably marked:
//! `provider` is the fallback literal, `degraded` is set, the status text
//! says why real data is unavailable, and any coordinates are labeled as
//! demo values. Coordinates derive from a SHA-256 digest of the identifier,
//! so output is reproducible for a given identifier.

use serde_json::json;
use sha2::{Digest, Sha256};
use shiptrack_common::models::FALLBACK_PROVIDER;
use shiptrack_common::{time, NormalizedTrackingResult, TrackingEvent};

/// Why the fallback generator was invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The selected provider has no configured credential
    MissingCredential { provider: String },
    /// The selected provider was called and the call failed
    UpstreamFailure { provider: String, detail: String },
    /// No registered provider pattern matched the identifier
    UnrecognizedIdentifier,
}

impl FallbackReason {
    /// Caller-facing status text explaining the degradation
    fn status_message(&self) -> String {
        match self {
            FallbackReason::MissingCredential { provider } => format!(
                "No live data: provider '{}' is not configured (missing credential). \
                 Showing placeholder data.",
                provider
            ),
            FallbackReason::UpstreamFailure { provider, detail } => format!(
                "No live data: provider '{}' could not be reached ({}). \
                 Showing placeholder data.",
                provider, detail
            ),
            FallbackReason::UnrecognizedIdentifier => {
                "No live data: identifier did not match any registered provider. \
                 Showing placeholder data."
                    .to_string()
            }
        }
    }

    /// Compact reason string for the structured `degraded_reason` field
    fn summary(&self) -> String {
        match self {
            FallbackReason::MissingCredential { provider } => {
                format!("missing credential for '{}'", provider)
            }
            FallbackReason::UpstreamFailure { provider, detail } => {
                format!("upstream failure from '{}': {}", provider, detail)
            }
            FallbackReason::UnrecognizedIdentifier => "unrecognized identifier".to_string(),
        }
    }

    fn requested_provider(&self) -> Option<&str> {
        match self {
            FallbackReason::MissingCredential { provider }
            | FallbackReason::UpstreamFailure { provider, .. } => Some(provider),
            FallbackReason::UnrecognizedIdentifier => None,
        }
    }
}

/// Produce a structurally valid, clearly synthetic tracking result
///
/// Never fails; deterministic given identifier + reason + current time.
pub fn generate_fallback(identifier: &str, reason: FallbackReason) -> NormalizedTrackingResult {
    let (lat, lon) = demo_coordinates(identifier);
    let shape = describe_identifier_shape(identifier);
    let now = time::now();

    let event = TrackingEvent {
        timestamp: now,
        location: format!("Demo coordinates {:.4}, {:.4} (not live data)", lat, lon),
        status_code: "FALLBACK".to_string(),
        description: format!("Synthetic placeholder event; identifier {}", shape),
    };

    NormalizedTrackingResult {
        tracking_number: identifier.to_string(),
        status: reason.status_message(),
        current_location: format!("Demo coordinates {:.4}, {:.4} (not live data)", lat, lon),
        observed_at: now,
        estimated_completion: None,
        events: vec![event],
        provider: FALLBACK_PROVIDER.to_string(),
        degraded: true,
        degraded_reason: Some(reason.summary()),
        raw: json!({
            "synthetic": true,
            "requested_provider": reason.requested_provider(),
            "identifier_shape": shape,
        }),
    }
}

/// Best-effort description of what an identifier's shape suggests
///
/// Purely informational; mirrors the registry/modality patterns but is
/// evaluated independently so it also works for identifiers nothing claims.
pub fn describe_identifier_shape(identifier: &str) -> &'static str {
    let normalized = identifier.trim().to_uppercase();

    if normalized.is_empty() {
        return "is empty";
    }

    let all_digits = normalized.bytes().all(|b| b.is_ascii_digit());

    if crate::providers::maersk::container_shape().is_match(&normalized) {
        "looks like an ISO 6346 container number"
    } else if normalized.starts_with("CMDU") {
        "looks like a CMA CGM bill of lading"
    } else if normalized.starts_with("1Z") {
        "looks like a UPS 1Z tracking number"
    } else if crate::tracking::unified::flight_shape().is_match(&normalized) {
        "looks like an IATA flight number"
    } else if all_digits && normalized.len() == 9 {
        "is nine digits, possibly an MMSI"
    } else if all_digits && normalized.len() == 10 {
        "is ten digits, possibly a DHL waybill"
    } else if all_digits {
        "is all digits, possibly a parcel tracking number"
    } else {
        "does not match any known identifier shape"
    }
}

/// Deterministic pseudo-coordinates for demo display
///
/// Derived from a SHA-256 digest of the identifier: latitude in [-60, 60],
/// longitude in [-180, 180]. These are presentation filler, always labeled
/// as demo values where displayed.
pub fn demo_coordinates(identifier: &str) -> (f64, f64) {
    let digest = Sha256::digest(identifier.as_bytes());
    let lat_seed = u16::from_be_bytes([digest[0], digest[1]]) as f64 / f64::from(u16::MAX);
    let lon_seed = u16::from_be_bytes([digest[2], digest[3]]) as f64 / f64::from(u16::MAX);
    (lat_seed * 120.0 - 60.0, lon_seed * 360.0 - 180.0)
}
