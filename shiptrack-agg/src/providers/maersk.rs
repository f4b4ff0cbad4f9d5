//! Maersk container tracking adapter
//!
//! Tracks ISO 6346 container numbers (4 letters + 7 digits) through the
//! Maersk track-and-trace API. Authentication is a `Consumer-Key` header.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use shiptrack_common::models::{UNKNOWN_LOCATION, UNKNOWN_STATUS};
use shiptrack_common::{time, NormalizedTrackingResult, TrackingEvent};

use super::{build_http_client, CarrierAdapter, TrackError};

const MAERSK_BASE_URL: &str = "https://api.maersk.com/track-and-trace";
const PROVIDER: &str = "maersk";

/// ISO 6346 container number: owner code + category + 6 digits + check digit
static CONTAINER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{4}\d{7}$").expect("valid container pattern"));

/// The container-number shape, shared with fallback shape description
pub(crate) fn container_shape() -> &'static Regex {
    &CONTAINER_SHAPE
}

/// Maersk track-and-trace response
#[derive(Debug, Clone, Deserialize)]
pub struct MaerskResponse {
    #[serde(default)]
    pub containers: Vec<MaerskContainer>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaerskContainer {
    /// Container number as known upstream
    pub container_number: String,
    /// Current transport status (e.g., "Vessel departed")
    pub transport_status: Option<String>,
    /// Last known location
    pub location: Option<MaerskLocation>,
    /// Estimated time of arrival at final destination
    pub estimated_time_of_arrival: Option<String>,
    /// Milestones, oldest first
    #[serde(default)]
    pub events: Vec<MaerskEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaerskLocation {
    pub terminal: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaerskEvent {
    pub event_date_time: String,
    /// Event code (e.g., "GATE-OUT", "LOAD")
    pub event_type: Option<String>,
    pub activity: Option<String>,
    pub location: Option<MaerskLocation>,
}

/// Maersk API client
pub struct MaerskClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl MaerskClient {
    pub fn new(api_key: Option<String>) -> shiptrack_common::Result<Self> {
        Ok(Self {
            http_client: build_http_client()?,
            api_key,
            base_url: MAERSK_BASE_URL.to_string(),
        })
    }

    /// Override the upstream endpoint (tests, API gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CarrierAdapter for MaerskClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn pattern(&self) -> &Regex {
        &CONTAINER_SHAPE
    }

    async fn track(&self, identifier: &str) -> Result<NormalizedTrackingResult, TrackError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TrackError::ProviderUnavailable(PROVIDER.to_string()))?;

        let url = format!("{}/{}", self.base_url, identifier.trim());
        tracing::debug!(container = identifier, "Querying Maersk track-and-trace API");

        let response = self
            .http_client
            .get(&url)
            .header("Consumer-Key", api_key)
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

        let parsed: MaerskResponse = serde_json::from_value(raw.clone())
            .map_err(|e| TrackError::upstream(PROVIDER, format!("Unexpected shape: {}", e)))?;

        let result = map_response(identifier, parsed, raw)?;

        tracing::info!(
            container = identifier,
            status = %result.status,
            events = result.events.len(),
            "Retrieved container status from Maersk"
        );

        Ok(result)
    }
}

/// Map a Maersk response into the normalized shape
fn map_response(
    identifier: &str,
    response: MaerskResponse,
    raw: serde_json::Value,
) -> Result<NormalizedTrackingResult, TrackError> {
    let container = response
        .containers
        .into_iter()
        .next()
        .ok_or_else(|| TrackError::upstream(PROVIDER, "Response contained no container data"))?;

    let mut events = Vec::with_capacity(container.events.len());
    for event in &container.events {
        let timestamp = time::parse_upstream_timestamp(&event.event_date_time)
            .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?;
        events.push(TrackingEvent {
            timestamp,
            location: format_location(event.location.as_ref()),
            status_code: event
                .event_type
                .clone()
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            description: event
                .activity
                .clone()
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        });
    }

    let estimated_completion = container
        .estimated_time_of_arrival
        .as_deref()
        .map(time::parse_upstream_timestamp)
        .transpose()
        .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?;

    Ok(NormalizedTrackingResult {
        tracking_number: identifier.to_string(),
        status: container
            .transport_status
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        current_location: format_location(container.location.as_ref()),
        observed_at: time::now(),
        estimated_completion,
        events,
        provider: PROVIDER.to_string(),
        degraded: false,
        degraded_reason: None,
        raw,
    })
}

fn format_location(location: Option<&MaerskLocation>) -> String {
    let Some(location) = location else {
        return UNKNOWN_LOCATION.to_string();
    };

    let parts: Vec<&str> = [
        location.terminal.as_deref(),
        location.city.as_deref(),
        location.country.as_deref(),
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
