//! DHL shipment tracking adapter
//!
//! Tracks 10-digit waybill numbers through the DHL unified tracking API.
//! Authentication is a `DHL-API-Key` header; the tracking number travels as
//! a query parameter.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use shiptrack_common::models::{UNKNOWN_LOCATION, UNKNOWN_STATUS};
use shiptrack_common::{time, NormalizedTrackingResult, TrackingEvent};

use super::{build_http_client, CarrierAdapter, TrackError};

const DHL_BASE_URL: &str = "https://api-eu.dhl.com/track/shipments";
const PROVIDER: &str = "dhl";

static WAYBILL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{10}$").expect("valid waybill pattern"));

#[derive(Debug, Clone, Deserialize)]
pub struct DhlResponse {
    #[serde(default)]
    pub shipments: Vec<DhlShipment>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhlShipment {
    pub id: Option<String>,
    pub status: Option<DhlEvent>,
    pub estimated_time_of_delivery: Option<String>,
    #[serde(default)]
    pub events: Vec<DhlEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhlEvent {
    pub timestamp: String,
    pub location: Option<DhlLocation>,
    pub status_code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DhlLocation {
    pub address: Option<DhlAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DhlAddress {
    pub address_locality: Option<String>,
    pub country_code: Option<String>,
}

/// DHL unified tracking API client
pub struct DhlClient {
    http_client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl DhlClient {
    pub fn new(api_key: Option<String>) -> shiptrack_common::Result<Self> {
        Ok(Self {
            http_client: build_http_client()?,
            api_key,
            base_url: DHL_BASE_URL.to_string(),
        })
    }

    /// Override the upstream endpoint (tests, API gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CarrierAdapter for DhlClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn pattern(&self) -> &Regex {
        &WAYBILL_SHAPE
    }

    async fn track(&self, identifier: &str) -> Result<NormalizedTrackingResult, TrackError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| TrackError::ProviderUnavailable(PROVIDER.to_string()))?;

        tracing::debug!(waybill = identifier, "Querying DHL tracking API");

        let response = self
            .http_client
            .get(&self.base_url)
            .header("DHL-API-Key", api_key)
            .query(&[("trackingNumber", identifier.trim())])
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

        let parsed: DhlResponse = serde_json::from_value(raw.clone())
            .map_err(|e| TrackError::upstream(PROVIDER, format!("Unexpected shape: {}", e)))?;

        let result = map_response(identifier, parsed, raw)?;

        tracing::info!(
            waybill = identifier,
            status = %result.status,
            events = result.events.len(),
            "Retrieved shipment status from DHL"
        );

        Ok(result)
    }
}

fn map_event(event: &DhlEvent) -> Result<TrackingEvent, TrackError> {
    Ok(TrackingEvent {
        timestamp: time::parse_upstream_timestamp(&event.timestamp)
            .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?,
        location: format_location(event.location.as_ref()),
        status_code: event
            .status_code
            .clone()
            .unwrap_or_else(|| "UNKNOWN".to_string()),
        description: event
            .description
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
    })
}

fn map_response(
    identifier: &str,
    response: DhlResponse,
    raw: serde_json::Value,
) -> Result<NormalizedTrackingResult, TrackError> {
    let shipment = response
        .shipments
        .into_iter()
        .next()
        .ok_or_else(|| TrackError::upstream(PROVIDER, "Response contained no shipment data"))?;

    let mut events = Vec::with_capacity(shipment.events.len());
    for event in &shipment.events {
        events.push(map_event(event)?);
    }

    let (status, current_location) = match shipment.status.as_ref() {
        Some(current) => (
            current
                .description
                .clone()
                .unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
            format_location(current.location.as_ref()),
        ),
        None => (UNKNOWN_STATUS.to_string(), UNKNOWN_LOCATION.to_string()),
    };

    let estimated_completion = shipment
        .estimated_time_of_delivery
        .as_deref()
        .map(time::parse_upstream_timestamp)
        .transpose()
        .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?;

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

fn format_location(location: Option<&DhlLocation>) -> String {
    let address = location.and_then(|l| l.address.as_ref());
    let Some(address) = address else {
        return UNKNOWN_LOCATION.to_string();
    };

    let parts: Vec<&str> = [
        address.address_locality.as_deref(),
        address.country_code.as_deref(),
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
