//! shiptrack-agg library interface
//!
//! Exposes public APIs for integration testing

pub mod api;
pub mod db;
pub mod error;
pub mod providers;
pub mod registry;
pub mod tracking;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::db::EventStore;
use crate::tracking::Tracker;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Dispatcher over the provider registry and modality adapters
    pub tracker: Arc<Tracker>,
    /// Event store handle for history queries
    pub event_store: EventStore,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, tracker: Arc<Tracker>) -> Self {
        let event_store = EventStore::new(db.clone());
        Self {
            db,
            tracker,
            event_store,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::tracking_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
