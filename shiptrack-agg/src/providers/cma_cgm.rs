//! CMA CGM bill-of-lading tracking adapter
//!
//! Tracks `CMDU`-prefixed bill-of-lading references. Authentication is a
//! `KeyId` header. Note the shape overlap with ISO 6346 container numbers:
//! `CMDU` + exactly 7 digits also matches the container pattern, and the
//! registry resolves that by registration order (containers first).

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use shiptrack_common::models::{UNKNOWN_LOCATION, UNKNOWN_STATUS};
use shiptrack_common::{time, NormalizedTrackingResult, TrackingEvent};

use super::{build_http_client, CarrierAdapter, TrackError};

const CMA_CGM_BASE_URL: &str = "https://apis.cma-cgm.net/shipping/shipments";
const PROVIDER: &str = "cma-cgm";

static BOL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CMDU\d{7,10}$").expect("valid bill-of-lading pattern"));

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmaCgmShipment {
    pub shipment_reference: String,
    pub current_status: Option<String>,
    pub current_port: Option<String>,
    pub estimated_arrival: Option<String>,
    #[serde(default)]
    pub milestones: Vec<CmaCgmMilestone>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmaCgmMilestone {
    pub date: String,
    pub port: Option<String>,
    pub code: Option<String>,
    pub label: Option<String>,
}

/// CMA CGM shipment API client
pub struct CmaCgmClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl CmaCgmClient {
    pub fn new(api_key: Option<String>) -> shiptrack_common::Result<Self> {
        Ok(Self {
            http_client: build_http_client()?,
            api_key,
            base_url: CMA_CGM_BASE_URL.to_string(),
        })
    }

    /// Override the upstream endpoint (tests, API gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CarrierAdapter for CmaCgmClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn pattern(&self) -> &Regex {
        &BOL_SHAPE
    }

    async fn track(&self, identifier: &str) -> Result<NormalizedTrackingResult, TrackError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TrackError::ProviderUnavailable(PROVIDER.to_string()))?;

        let url = format!("{}/{}", self.base_url, identifier.trim());
        tracing::debug!(bill_of_lading = identifier, "Querying CMA CGM shipment API");

        let response = self
            .http_client
            .get(&url)
            .header("KeyId", api_key)
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

        let parsed: CmaCgmShipment = serde_json::from_value(raw.clone())
            .map_err(|e| TrackError::upstream(PROVIDER, format!("Unexpected shape: {}", e)))?;

        let result = map_response(identifier, parsed, raw)?;

        tracing::info!(
            bill_of_lading = identifier,
            status = %result.status,
            milestones = result.events.len(),
            "Retrieved shipment status from CMA CGM"
        );

        Ok(result)
    }
}

fn map_response(
    identifier: &str,
    shipment: CmaCgmShipment,
    raw: serde_json::Value,
) -> Result<NormalizedTrackingResult, TrackError> {
    let mut events = Vec::with_capacity(shipment.milestones.len());
    for milestone in &shipment.milestones {
        let timestamp = time::parse_upstream_timestamp(&milestone.date)
            .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?;
        events.push(TrackingEvent {
            timestamp,
            location: milestone
                .port
                .clone()
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            status_code: milestone
                .code
                .clone()
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            description: milestone
                .label
                .clone()
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        });
    }

    let estimated_completion = shipment
        .estimated_arrival
        .as_deref()
        .map(time::parse_upstream_timestamp)
        .transpose()
        .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?;

    Ok(NormalizedTrackingResult {
        tracking_number: identifier.to_string(),
        status: shipment
            .current_status
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        current_location: shipment
            .current_port
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
        observed_at: time::now(),
        estimated_completion,
        events,
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
    fn test_bill_of_lading_pattern() {
        assert!(BOL_SHAPE.is_match("CMDU1234567"));
        assert!(BOL_SHAPE.is_match("CMDU1234567890"));
        assert!(!BOL_SHAPE.is_match("CMDU123456"));
        assert!(!BOL_SHAPE.is_match("MAEU1234567"));
        assert!(!BOL_SHAPE.is_match("CMDU12345678901"));
    }

    #[test]
    fn test_map_response() {
        let raw = json!({
            "shipmentReference": "CMDU12345678",
            "currentStatus": "Discharged",
            "currentPort": "Le Havre",
            "estimatedArrival": "2026-08-15",
            "milestones": [
                { "date": "2026-07-20T08:00:00Z", "port": "Shanghai", "code": "VD", "label": "Vessel departure" },
                { "date": "2026-08-10T14:00:00Z", "port": "Le Havre", "code": "VA", "label": "Vessel arrival" }
            ]
        });
        let parsed: CmaCgmShipment = serde_json::from_value(raw.clone()).unwrap();

        let result = map_response("CMDU12345678", parsed, raw).unwrap();

        assert_eq!(result.provider, "cma-cgm");
        assert_eq!(result.status, "Discharged");
        assert_eq!(result.current_location, "Le Havre");
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[1].status_code, "VA");
        assert!(result.estimated_completion.is_some());
    }

    #[test]
    fn test_map_response_without_milestones() {
        let raw = json!({ "shipmentReference": "CMDU12345678" });
        let parsed: CmaCgmShipment = serde_json::from_value(raw.clone()).unwrap();

        let result = map_response("CMDU12345678", parsed, raw).unwrap();

        assert_eq!(result.status, UNKNOWN_STATUS);
        assert_eq!(result.current_location, UNKNOWN_LOCATION);
        assert!(result.events.is_empty());
        assert!(result.estimated_completion.is_none());
    }

    #[test]
    fn test_map_response_rejects_malformed_milestone_date() {
        let raw = json!({
            "shipmentReference": "CMDU12345678",
            "milestones": [{ "date": "soon" }]
        });
        let parsed: CmaCgmShipment = serde_json::from_value(raw.clone()).unwrap();

        assert!(map_response("CMDU12345678", parsed, raw).is_err());
    }

    #[tokio::test]
    async fn test_track_without_credential_is_unavailable() {
        let client = CmaCgmClient::new(None).unwrap();
        assert!(matches!(
            client.track("CMDU12345678").await,
            Err(TrackError::ProviderUnavailable(_))
        ));
    }
}
