//! Tracking endpoints
//!
//! The tracking endpoints mirror the dispatcher contract: they answer 200
//! with a well-formed result for any identifier (fallback results included)
//! and reserve 400 for caller programming errors — an unknown provider hint
//! or an invalid modality value.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use shiptrack_common::{Modality, NormalizedTrackingResult, TrackingEvent};

use crate::error::{ApiError, ApiResult};
use crate::providers::TrackError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TrackParams {
    /// Explicit provider hint; skips classification
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnifiedParams {
    /// aviation | maritime | ground | auto (default auto)
    pub modality: Option<String>,
}

/// GET /track/:identifier?provider=name
pub async fn track_shipment(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(params): Query<TrackParams>,
) -> ApiResult<Json<NormalizedTrackingResult>> {
    let result = state
        .tracker
        .track_shipment(&identifier, params.provider.as_deref())
        .await
        .map_err(|err| match err {
            TrackError::UnknownProviderHint(hint) => {
                ApiError::BadRequest(format!("Unknown provider hint '{}'", hint))
            }
            other => ApiError::Internal(other.to_string()),
        })?;

    Ok(Json(result))
}

/// GET /track/unified/:identifier?modality=auto
pub async fn track_unified(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(params): Query<UnifiedParams>,
) -> ApiResult<Json<NormalizedTrackingResult>> {
    let modality = match params.modality.as_deref() {
        Some(value) => value
            .parse::<Modality>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => Modality::Auto,
    };

    let result = state.tracker.track_unified(&identifier, modality).await;

    Ok(Json(result))
}

/// GET /history/:identifier
///
/// Persisted events for a tracking number, oldest receipt first.
pub async fn tracking_history(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<Vec<TrackingEvent>>> {
    let events = state.event_store.query(&identifier).await?;
    Ok(Json(events))
}

/// Build tracking routes
pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route("/track/unified/:identifier", get(track_unified))
        .route("/track/:identifier", get(track_shipment))
        .route("/history/:identifier", get(tracking_history))
}
