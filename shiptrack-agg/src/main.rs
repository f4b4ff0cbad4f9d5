//! shiptrack-agg - Multi-Carrier Shipment Tracking Aggregator
//!
//! Accepts an opaque identifier (container number, bill of lading, parcel
//! tracking number, flight number, MMSI), infers which external tracking
//! provider it belongs to, queries that provider, normalizes the response
//! into one result schema, persists the event history, and degrades to
//! clearly-marked placeholder data when live data cannot be obtained.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use shiptrack_agg::db::EventStore;
use shiptrack_agg::tracking::Tracker;
use shiptrack_agg::AppState;
use shiptrack_common::config::{self, ResolvedCredentials};

const DEFAULT_BIND: &str = "127.0.0.1:5810";

#[derive(Debug, Parser)]
#[command(
    name = "shiptrack-agg",
    about = "Multi-carrier shipment tracking aggregator"
)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides config file)
    #[arg(long, env = "SHIPTRACK_DB")]
    database: Option<PathBuf>,

    /// Listen address (overrides config file)
    #[arg(long, env = "SHIPTRACK_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting shiptrack-agg (Shipment Tracking Aggregator)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Configuration file: CLI argument, then platform default location
    let config_path = args.config.or_else(config::default_config_path);
    let toml_config = match &config_path {
        Some(path) => config::load_toml_config(path)?,
        None => Default::default(),
    };

    // Database path: CLI/env, then TOML, then platform default
    let db_path = args
        .database
        .or_else(|| toml_config.database_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(config::default_database_path);
    info!("Database: {}", db_path.display());

    let db_pool = shiptrack_agg::db::init_database_pool(&db_path).await?;
    info!("Database connection established");

    // Resolve provider credentials (ENV beats TOML) and build the
    // dispatcher; unconfigured providers answer with fallback data
    let credentials = ResolvedCredentials::resolve(&toml_config);
    let store = EventStore::new(db_pool.clone());
    let tracker = Tracker::from_credentials(&credentials, store)?;
    info!(
        providers = ?tracker.registry().names(),
        "Provider registry initialized"
    );

    let state = AppState::new(db_pool, Arc::new(tracker));
    let app = shiptrack_agg::build_router(state);

    let bind = args
        .bind
        .or(toml_config.bind_address)
        .unwrap_or_else(|| DEFAULT_BIND.to_string());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
