//! Flight-data adapter (aviationstack-style API)
//!
//! Tracks IATA flight numbers (airline code + up to four digits).
//! Authentication is an `access_key` query parameter. A flight's "events"
//! are its departure and arrival milestones.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use shiptrack_common::models::{UNKNOWN_LOCATION, UNKNOWN_STATUS};
use shiptrack_common::{time, NormalizedTrackingResult, TrackingEvent};

use super::{build_http_client, CarrierAdapter, TrackError};

const AVIATIONSTACK_BASE_URL: &str = "https://api.aviationstack.com/v1/flights";
const PROVIDER: &str = "aviationstack";

/// IATA flight number: 2-3 char airline code + flight digits + optional suffix
static FLIGHT_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{2,3}\s?\d{1,4}[A-Z]?$").expect("valid flight pattern"));

#[derive(Debug, Clone, Deserialize)]
pub struct AviationstackResponse {
    #[serde(default)]
    pub data: Vec<AviationstackFlight>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AviationstackFlight {
    pub flight_status: Option<String>,
    pub airline: Option<AviationstackAirline>,
    pub departure: Option<AviationstackEndpoint>,
    pub arrival: Option<AviationstackEndpoint>,
    pub live: Option<AviationstackLive>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AviationstackAirline {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AviationstackEndpoint {
    pub airport: Option<String>,
    pub iata: Option<String>,
    pub scheduled: Option<String>,
    pub actual: Option<String>,
    pub estimated: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AviationstackLive {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

/// aviationstack API client
pub struct AviationstackClient {
    http_client: reqwest::Client,
    access_key: Option<String>,
    base_url: String,
}

impl AviationstackClient {
    pub fn new(access_key: Option<String>) -> shiptrack_common::Result<Self> {
        Ok(Self {
            http_client: build_http_client()?,
            access_key,
            base_url: AVIATIONSTACK_BASE_URL.to_string(),
        })
    }

    /// Override the upstream endpoint (tests, API gateways)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CarrierAdapter for AviationstackClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn pattern(&self) -> &Regex {
        &FLIGHT_SHAPE
    }

    async fn track(&self, identifier: &str) -> Result<NormalizedTrackingResult, TrackError> {
        let access_key = self
            .access_key
            .as_deref()
            .ok_or_else(|| TrackError::ProviderUnavailable(PROVIDER.to_string()))?;

        // "AF 1234" and "af1234" both query as "AF1234"
        let flight_iata = identifier.trim().replace(' ', "").to_uppercase();
        tracing::debug!(flight = %flight_iata, "Querying aviationstack flights API");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("access_key", access_key), ("flight_iata", &flight_iata)])
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

        let parsed: AviationstackResponse = serde_json::from_value(raw.clone())
            .map_err(|e| TrackError::upstream(PROVIDER, format!("Unexpected shape: {}", e)))?;

        let result = map_response(identifier, parsed, raw)?;

        tracing::info!(
            flight = %flight_iata,
            status = %result.status,
            "Retrieved flight status from aviationstack"
        );

        Ok(result)
    }
}

fn map_response(
    identifier: &str,
    response: AviationstackResponse,
    raw: serde_json::Value,
) -> Result<NormalizedTrackingResult, TrackError> {
    let flight = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| TrackError::upstream(PROVIDER, "No flight data for this flight number"))?;

    let mut events = Vec::new();
    if let Some(event) = endpoint_event(flight.departure.as_ref(), "DEP", "Departure")? {
        events.push(event);
    }
    if let Some(event) = endpoint_event(flight.arrival.as_ref(), "ARR", "Arrival")? {
        events.push(event);
    }

    let current_location = match flight.live.as_ref() {
        Some(live) => match (live.latitude, live.longitude) {
            (Some(lat), Some(lon)) => format!("In flight at {:.4}, {:.4}", lat, lon),
            _ => UNKNOWN_LOCATION.to_string(),
        },
        None => flight
            .departure
            .as_ref()
            .and_then(|d| d.airport.clone().or_else(|| d.iata.clone()))
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
    };

    let estimated_completion = flight
        .arrival
        .as_ref()
        .and_then(|a| a.estimated.as_deref().or(a.scheduled.as_deref()))
        .map(time::parse_upstream_timestamp)
        .transpose()
        .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?;

    let status = match (flight.flight_status.as_deref(), flight.airline.as_ref()) {
        (Some(s), Some(airline)) if airline.name.is_some() => {
            format!("{} ({})", s, airline.name.clone().unwrap_or_default())
        }
        (Some(s), _) => s.to_string(),
        (None, _) => UNKNOWN_STATUS.to_string(),
    };

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

/// Turn a departure/arrival block into a milestone, if it carries a time
fn endpoint_event(
    endpoint: Option<&AviationstackEndpoint>,
    code: &str,
    label: &str,
) -> Result<Option<TrackingEvent>, TrackError> {
    let Some(endpoint) = endpoint else {
        return Ok(None);
    };

    let Some(when) = endpoint
        .actual
        .as_deref()
        .or(endpoint.estimated.as_deref())
        .or(endpoint.scheduled.as_deref())
    else {
        return Ok(None);
    };

    let timestamp = time::parse_upstream_timestamp(when)
        .map_err(|e| TrackError::upstream(PROVIDER, e.to_string()))?;
    let airport = endpoint
        .airport
        .clone()
        .or_else(|| endpoint.iata.clone())
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    Ok(Some(TrackingEvent {
        timestamp,
        location: airport.clone(),
        status_code: code.to_string(),
        description: format!("{} {}", label, airport),
    }))
}
