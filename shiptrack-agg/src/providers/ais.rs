//! Vessel-position adapter (AIS feed)
//!
//! Looks up a vessel's last reported AIS position by its 9-digit MMSI.
//! Authentication is an `apikey` query parameter. AIS reports a single
//! position snapshot, so the normalized result carries exactly one event.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use shiptrack_common::models::UNKNOWN_STATUS;
use shiptrack_common::{time, NormalizedTrackingResult, TrackingEvent};

use super::{build_http_client, CarrierAdapter, TrackError};

const AIS_BASE_URL: &str = "https://api.aisfeed.io/v1/vessels";
const PROVIDER: &str = "aisfeed";

/// Maritime Mobile Service Identity: exactly nine digits
static MMSI_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{9}$").expect("valid MMSI pattern"));

#[derive(Debug, Clone, Deserialize)]
pub struct AisPosition {
    pub mmsi: Option<u64>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Speed over ground in knots
    pub speed: Option<f64>,
    /// Navigational status text (e.g., "Under way using engine")
    pub navigational_status: Option<String>,
    pub destination: Option<String>,
    pub eta: Option<String>,
    /// When the position was reported
    pub timestamp: Option<String>,
}

/// AIS position feed client
pub struct AisClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl AisClient {
    pub fn new(api_key: Option<String>) -> shiptrack_common::Result<Self> {
        Ok(Self {
            http_client: build_http_client()?,
            api_key,
            base_url: AIS_BASE_URL.to_string(),
        })
    }

    /// Override the upstream endpoint (tests, API gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CarrierAdapter for AisClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn pattern(&self) -> &Regex {
        &MMSI_SHAPE
    }

    async fn track(&self, identifier: &str) -> Result<NormalizedTrackingResult, TrackError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TrackError::ProviderUnavailable(PROVIDER.to_string()))?;

        let url = format!("{}/{}/position", self.base_url, identifier.trim());
        tracing::debug!(mmsi = identifier, "Querying AIS position feed");

        let response = self
            .http_client
            .get(&url)
            .query(&[("apikey", api_key)])
            .send()
            .await
            .map_err(|e| TrackError::upstream(PROVIDER, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TrackError::upstream(
                PROVIDER,
                format!("HTTP {}: {}", status.as_u16(), error_text),
            ));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| TrackError::upstream(PROVIDER, format!("Malformed payload: {}", e)))?;

        let parsed: AisPosition = serde_json::from_value(raw.clone())
            .map_err(|e| TrackError::upstream(PROVIDER, format!("Unexpected shape: {}", e)))?;

        let result = map_response(identifier, parsed, raw)?;

        tracing::info!(
            mmsi = identifier,
            status = %result.status,
            location = %result.current_location,
            "Retrieved vessel position from AIS feed"
        );

        Ok(result)
    }
}

fn map_response(
    identifier: &str,
    position: AisPosition,
    raw: serde_json::Value,
) -> Result<NormalizedTrackingResult, TrackError> {
    let reported_at = position
        .timestamp
        .as_deref()
        .map(time::parse_upstream_timestamp)
        .transpose()
        .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?
        .unwrap_or_else(time::now);

    let current_location = match (position.latitude, position.longitude) {
        (Some(lat), Some(lon)) => match position.destination.as_deref() {
            Some(destination) if !destination.trim().is_empty() => {
                format!("{:.4}, {:.4} (bound for {})", lat, lon, destination.trim())
            }
            _ => format!("{:.4}, {:.4}", lat, lon),
        },
        // A position feed without a position is not a usable answer
        _ => {
            return Err(TrackError::upstream(
                PROVIDER,
                "Position report without coordinates",
            ))
        }
    };

    let status = match (
        position.navigational_status.as_deref(),
        position.speed,
    ) {
        (Some(nav), Some(speed)) => format!("{} at {:.1} kn", nav, speed),
        (Some(nav), None) => nav.to_string(),
        (None, Some(speed)) => format!("Under way at {:.1} kn", speed),
        (None, None) => UNKNOWN_STATUS.to_string(),
    };

    let vessel = position
        .name
        .clone()
        .unwrap_or_else(|| format!("MMSI {}", identifier));

    let estimated_completion = position
        .eta
        .as_deref()
        .map(time::parse_upstream_timestamp)
        .transpose()
        .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?;

    let event = TrackingEvent {
        timestamp: reported_at,
        location: current_location.clone(),
        status_code: "POS".to_string(),
        description: format!("AIS position report for {}", vessel),
    };

    Ok(NormalizedTrackingResult {
        tracking_number: identifier.to_string(),
        status,
        current_location,
        observed_at: time::now(),
        estimated_completion,
        events: vec![event],
        provider: PROVIDER.to_string(),
        degraded: false,
        degraded_reason: None,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mmsi_pattern() {
        assert!(MMSI_SHAPE.is_match("123456789"));
        assert!(MMSI_SHAPE.is_match("228337600"));
        assert!(!MMSI_SHAPE.is_match("12345678"));
        assert!(!MMSI_SHAPE.is_match("1234567890"));
        assert!(!MMSI_SHAPE.is_match("12345678A"));
    }

    #[test]
    fn test_map_response() {
        let raw = json!({
            "mmsi": 228337600,
            "name": "CMA CGM MARCO POLO",
            "latitude": 36.1408,
            "longitude": -5.3536,
            "speed": 14.2,
            "navigational_status": "Under way using engine",
            "destination": "ROTTERDAM",
            "eta": "2026-08-12T04:00:00Z",
            "timestamp": "2026-08-06T09:41:00Z"
        });
        let parsed: AisPosition = serde_json::from_value(raw.clone()).unwrap();

        let result = map_response("228337600", parsed, raw).unwrap();

        assert_eq!(result.provider, "aisfeed");
        assert_eq!(result.status, "Under way using engine at 14.2 kn");
        assert_eq!(result.current_location, "36.1408, -5.3536 (bound for ROTTERDAM)");
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].status_code, "POS");
        assert!(result.events[0].description.contains("CMA CGM MARCO POLO"));
        assert!(result.estimated_completion.is_some());
    }

    #[test]
    fn test_map_response_without_coordinates_is_error() {
        let raw = json!({ "mmsi": 228337600, "name": "GHOST" });
        let parsed: AisPosition = serde_json::from_value(raw.clone()).unwrap();

        assert!(map_response("228337600", parsed, raw).is_err());
    }

    #[test]
    fn test_map_response_rejects_malformed_eta() {
        let raw = json!({
            "mmsi": 228337600,
            "latitude": 1.0,
            "longitude": 2.0,
            "eta": "whenever"
        });
        let parsed: AisPosition = serde_json::from_value(raw.clone()).unwrap();

        assert!(map_response("228337600", parsed, raw).is_err());
    }

    #[tokio::test]
    async fn test_track_without_credential_is_unavailable() {
        let client = AisClient::new(None).unwrap();
        assert!(matches!(
            client.track("228337600").await,
            Err(TrackError::ProviderUnavailable(_))
        ));
    }
}
