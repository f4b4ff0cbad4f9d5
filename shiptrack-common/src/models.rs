//! Canonical tracking result and event models
//!
//! Every provider adapter maps its upstream response into these shapes, so
//! callers consume one schema regardless of which external system answered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Provider marker used when a result was synthesized instead of fetched live
pub const FALLBACK_PROVIDER: &str = "fallback";

/// Sentinel for a location the upstream response did not supply
pub const UNKNOWN_LOCATION: &str = "Location unknown";

/// Sentinel for a status the upstream response did not supply
pub const UNKNOWN_STATUS: &str = "Status unavailable";

/// One normalized milestone in a shipment's history
///
/// Created only as a byproduct of a tracking call (live or fallback) and
/// never updated afterwards; the event store persists these append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// When the milestone occurred according to the provider
    pub timestamp: DateTime<Utc>,
    /// Where the milestone occurred (free text, best effort)
    pub location: String,
    /// Provider status code (e.g., "GATE-OUT", "DEP", vocabulary passed through)
    pub status_code: String,
    /// Human-readable description of the milestone
    pub description: String,
}

/// The canonical output shape of every tracking call
///
/// Identical regardless of source provider. Degraded/synthetic data is
/// distinguishable only via `provider`, `degraded` and `degraded_reason`;
/// there is no error channel for callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTrackingResult {
    /// Echoes the caller-supplied identifier untouched
    pub tracking_number: String,
    /// Current state in the provider's own vocabulary (free text)
    pub status: String,
    /// Best-effort current location (never empty; sentinel when unknown)
    pub current_location: String,
    /// Timestamp of this snapshot
    pub observed_at: DateTime<Utc>,
    /// Estimated delivery/arrival, when the provider supplies one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
    /// Milestone history, oldest first as returned by the provider
    pub events: Vec<TrackingEvent>,
    /// Name of the producing provider, or [`FALLBACK_PROVIDER`]
    pub provider: String,
    /// True when this result was synthesized rather than fetched live
    pub degraded: bool,
    /// Why the result is degraded, when it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
    /// Opaque provider payload retained for audit/debug
    pub raw: serde_json::Value,
}

impl NormalizedTrackingResult {
    /// Whether this result came from the fallback generator
    pub fn is_fallback(&self) -> bool {
        self.provider == FALLBACK_PROVIDER
    }
}

/// Transport domain of a tracking request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Flight tracking by flight number
    Aviation,
    /// Vessel position by MMSI
    Maritime,
    /// Parcel/container tracking through the ground registry
    Ground,
    /// Detect the modality from the identifier's shape
    Auto,
}

impl FromStr for Modality {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aviation" => Ok(Modality::Aviation),
            "maritime" => Ok(Modality::Maritime),
            "ground" => Ok(Modality::Ground),
            "auto" => Ok(Modality::Auto),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown modality '{}' (expected aviation, maritime, ground or auto)",
                other
            ))),
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modality::Aviation => "aviation",
            Modality::Maritime => "maritime",
            Modality::Ground => "ground",
            Modality::Auto => "auto",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_from_str() {
        assert_eq!("aviation".parse::<Modality>().unwrap(), Modality::Aviation);
        assert_eq!("MARITIME".parse::<Modality>().unwrap(), Modality::Maritime);
        assert_eq!(" ground ".parse::<Modality>().unwrap(), Modality::Ground);
        assert_eq!("auto".parse::<Modality>().unwrap(), Modality::Auto);
    }

    #[test]
    fn test_modality_from_str_rejects_unknown() {
        assert!("rail".parse::<Modality>().is_err());
        assert!("".parse::<Modality>().is_err());
    }

    #[test]
    fn test_modality_display_round_trip() {
        for m in [
            Modality::Aviation,
            Modality::Maritime,
            Modality::Ground,
            Modality::Auto,
        ] {
            assert_eq!(m.to_string().parse::<Modality>().unwrap(), m);
        }
    }

    #[test]
    fn test_is_fallback() {
        let result = NormalizedTrackingResult {
            tracking_number: "X".to_string(),
            status: UNKNOWN_STATUS.to_string(),
            current_location: UNKNOWN_LOCATION.to_string(),
            observed_at: Utc::now(),
            estimated_completion: None,
            events: vec![],
            provider: FALLBACK_PROVIDER.to_string(),
            degraded: true,
            degraded_reason: Some("test".to_string()),
            raw: serde_json::Value::Null,
        };
        assert!(result.is_fallback());

        let live = NormalizedTrackingResult {
            provider: "maersk".to_string(),
            degraded: false,
            degraded_reason: None,
            ..result
        };
        assert!(!live.is_fallback());
    }
}
