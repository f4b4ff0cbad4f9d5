//! UPS parcel tracking adapter
//!
//! Tracks `1Z` tracking numbers through the UPS Track API. Authentication is
//! an OAuth bearer token. UPS reports activity timestamps as separate
//! `YYYYMMDD` / `HHMMSS` fields, parsed here rather than in the shared
//! timestamp utilities.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use shiptrack_common::models::{UNKNOWN_LOCATION, UNKNOWN_STATUS};
use shiptrack_common::{time, NormalizedTrackingResult, TrackingEvent};

use super::{build_http_client, CarrierAdapter, TrackError};

const UPS_BASE_URL: &str = "https://onlinetools.ups.com/api/track/v1/details";
const PROVIDER: &str = "ups";

static UPS_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1Z[A-Z0-9]{16}$").expect("valid 1Z pattern"));

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsResponse {
    pub track_response: UpsTrackResponse,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsTrackResponse {
    #[serde(default)]
    pub shipment: Vec<UpsShipment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsShipment {
    #[serde(default)]
    pub package: Vec<UpsPackage>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsPackage {
    pub tracking_number: Option<String>,
    /// Newest first upstream; reversed during mapping to oldest-first
    #[serde(default)]
    pub activity: Vec<UpsActivity>,
    pub delivery_date: Option<UpsDeliveryDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsActivity {
    pub date: String,
    pub time: String,
    pub status: Option<UpsStatus>,
    pub location: Option<UpsActivityLocation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsStatus {
    #[serde(rename = "type")]
    pub status_type: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsActivityLocation {
    pub address: Option<UpsAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsAddress {
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpsDeliveryDate {
    pub date: Option<String>,
}

/// UPS Track API client
pub struct UpsClient {
    http_client: reqwest::Client,
    bearer_token: Option<String>,
    base_url: String,
}

impl UpsClient {
    pub fn new(bearer_token: Option<String>) -> shiptrack_common::Result<Self> {
        Ok(Self {
            http_client: build_http_client()?,
            bearer_token,
            base_url: UPS_BASE_URL.to_string(),
        })
    }

    /// Override the upstream endpoint (tests, API gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CarrierAdapter for UpsClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn pattern(&self) -> &Regex {
        &UPS_SHAPE
    }

    async fn track(&self, identifier: &str) -> Result<NormalizedTrackingResult, TrackError> {
        let token = self
            .bearer_token
            .as_deref()
            .ok_or_else(|| TrackError::ProviderUnavailable(PROVIDER.to_string()))?;

        let url = format!("{}/{}", self.base_url, identifier.trim());
        tracing::debug!(tracking_number = identifier, "Querying UPS Track API");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
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

        let parsed: UpsResponse = serde_json::from_value(raw.clone())
            .map_err(|e| TrackError::upstream(PROVIDER, format!("Unexpected shape: {}", e)))?;

        let result = map_response(identifier, parsed, raw)?;

        tracing::info!(
            tracking_number = identifier,
            status = %result.status,
            activities = result.events.len(),
            "Retrieved package status from UPS"
        );

        Ok(result)
    }
}

/// Parse UPS split date/time fields ("20260801" + "142300") into UTC
fn parse_ups_timestamp(date: &str, hhmmss: &str) -> Result<DateTime<Utc>, TrackError> {
    NaiveDateTime::parse_from_str(&format!("{} {}", date.trim(), hhmmss.trim()), "%Y%m%d %H%M%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            TrackError::upstream(
                PROVIDER,
                format!("Unparseable activity timestamp '{} {}': {}", date, hhmmss, e),
            )
        })
}

fn map_response(
    identifier: &str,
    response: UpsResponse,
    raw: serde_json::Value,
) -> Result<NormalizedTrackingResult, TrackError> {
    let package = response
        .track_response
        .shipment
        .into_iter()
        .flat_map(|s| s.package)
        .next()
        .ok_or_else(|| TrackError::upstream(PROVIDER, "Response contained no package data"))?;

    // UPS lists newest activity first
    let mut events = Vec::with_capacity(package.activity.len());
    for activity in package.activity.iter().rev() {
        events.push(TrackingEvent {
            timestamp: parse_ups_timestamp(&activity.date, &activity.time)?,
            location: format_address(activity.location.as_ref().and_then(|l| l.address.as_ref())),
            status_code: activity
                .status
                .as_ref()
                .and_then(|s| s.status_type.clone())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            description: activity
                .status
                .as_ref()
                .and_then(|s| s.description.clone())
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        });
    }

    let latest = events.last();
    let status = latest
        .map(|e| e.description.clone())
        .unwrap_or_else(|| UNKNOWN_STATUS.to_string());
    let current_location = latest
        .map(|e| e.location.clone())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    let estimated_completion = package
        .delivery_date
        .as_ref()
        .and_then(|d| d.date.as_deref())
        .map(|d| {
            time::parse_upstream_timestamp(d)
                .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))
        })
        .transpose()?;

    Ok(NormalizedTrackingResult {
        tracking_number: identifier.to_string(),
        status,
        current_location,
        observed_at: time::now(),
        estimated_completion,
        events,
        provider: PROVIDER.to_string(),
        degraded: false,
        degraded_reason: None,
        raw,
    })
}

fn format_address(address: Option<&UpsAddress>) -> String {
    let Some(address) = address else {
        return UNKNOWN_LOCATION.to_string();
    };

    let parts: Vec<&str> = [
        address.city.as_deref(),
        address.state_province.as_deref(),
        address.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_payload() -> serde_json::Value {
        json!({
            "trackResponse": {
                "shipment": [{
                    "package": [{
                        "trackingNumber": "1Z999AA10123456784",
                        "deliveryDate": { "date": "2026-08-09" },
                        "activity": [
                            {
                                "date": "20260807", "time": "091500",
                                "status": { "type": "I", "description": "Arrived at facility" },
                                "location": { "address": { "city": "Louisville", "stateProvince": "KY", "country": "US" } }
                            },
                            {
                                "date": "20260806", "time": "183000",
                                "status": { "type": "P", "description": "Pickup scan" },
                                "location": { "address": { "city": "Atlanta", "stateProvince": "GA", "country": "US" } }
                            }
                        ]
                    }]
                }]
            }
        })
    }

    #[test]
    fn test_1z_pattern() {
        assert!(UPS_SHAPE.is_match("1Z999AA10123456784"));
        assert!(!UPS_SHAPE.is_match("1Z999AA101234567"));
        assert!(!UPS_SHAPE.is_match("MAEU1234567"));
        assert!(!UPS_SHAPE.is_match("2Z999AA10123456784"));
    }

    #[test]
    fn test_parse_ups_timestamp() {
        let dt = parse_ups_timestamp("20260801", "142300").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-08-01T14:23:00+00:00");
    }

    #[test]
    fn test_parse_ups_timestamp_rejects_malformed() {
        assert!(parse_ups_timestamp("2026-08-01", "142300").is_err());
        assert!(parse_ups_timestamp("20260801", "2:23 pm").is_err());
    }

    #[test]
    fn test_map_response_reverses_to_oldest_first() {
        let raw = sample_payload();
        let parsed: UpsResponse = serde_json::from_value(raw.clone()).unwrap();

        let result = map_response("1Z999AA10123456784", parsed, raw).unwrap();

        assert_eq!(result.provider, "ups");
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].description, "Pickup scan");
        assert_eq!(result.events[1].description, "Arrived at facility");
        assert!(result.events[0].timestamp < result.events[1].timestamp);
        // Status reflects the newest activity
        assert_eq!(result.status, "Arrived at facility");
        assert_eq!(result.current_location, "Louisville, KY, US");
        assert!(result.estimated_completion.is_some());
    }

    #[test]
    fn test_map_response_without_activity() {
        let raw = json!({
            "trackResponse": { "shipment": [{ "package": [{ "trackingNumber": "1Z999AA10123456784" }] }] }
        });
        let parsed: UpsResponse = serde_json::from_value(raw.clone()).unwrap();

        let result = map_response("1Z999AA10123456784", parsed, raw).unwrap();

        assert_eq!(result.status, UNKNOWN_STATUS);
        assert_eq!(result.current_location, UNKNOWN_LOCATION);
        assert!(result.events.is_empty());
    }

    #[test]
    fn test_map_response_rejects_empty_shipments() {
        let raw = json!({ "trackResponse": { "shipment": [] } });
        let parsed: UpsResponse = serde_json::from_value(raw.clone()).unwrap();

        assert!(map_response("1Z999AA10123456784", parsed, raw).is_err());
    }

    #[tokio::test]
    async fn test_track_without_credential_is_unavailable() {
        let client = UpsClient::new(None).unwrap();
        assert!(matches!(
            client.track("1Z999AA10123456784").await,
            Err(TrackError::ProviderUnavailable(_))
        ));
    }
}
