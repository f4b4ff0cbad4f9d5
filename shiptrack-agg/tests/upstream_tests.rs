//! Upstream behavior tests against an in-process stub server
//!
//! A throwaway axum server on 127.0.0.1:0 stands in for the provider API so
//! the live-call path (success, HTTP 500, malformed payload) is exercised
//! end to end without touching the network.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use shiptrack_agg::db::EventStore;
use shiptrack_agg::providers::{AisClient, AviationstackClient, MaerskClient};
use shiptrack_agg::registry::ProviderRegistry;
use shiptrack_agg::tracking::Tracker;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    shiptrack_agg::db::init_tables(&pool)
        .await
        .expect("init tables");
    pool
}

/// Serve `router` on an ephemeral port and return its address
async fn spawn_stub(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    addr
}

/// Tracker whose only ground provider is a Maersk adapter aimed at the stub
async fn tracker_against(addr: SocketAddr, pool: SqlitePool) -> Tracker {
    let maersk = MaerskClient::new(Some("test-key".to_string()))
        .expect("maersk client")
        .with_base_url(format!("http://{}", addr));
    let registry = ProviderRegistry::new(vec![Arc::new(maersk)]);

    Tracker::new(
        registry,
        Arc::new(AviationstackClient::new(None).expect("aviation client")),
        Arc::new(AisClient::new(None).expect("ais client")),
        EventStore::new(pool),
    )
}

#[tokio::test]
async fn test_http_500_degrades_to_fallback_with_single_append() {
    let stub = axum::Router::new()
        .fallback(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") });
    let addr = spawn_stub(stub).await;

    let pool = memory_pool().await;
    let tracker = tracker_against(addr, pool.clone()).await;

    let result = tracker.track_shipment("MAEU1234567", None).await.unwrap();

    assert!(result.is_fallback());
    assert!(result.degraded);
    let reason = result.degraded_reason.as_deref().unwrap();
    assert!(reason.contains("maersk"));
    assert!(reason.contains("500"));

    // Exactly one append: the fallback's synthetic event
    let store = EventStore::new(pool);
    let events = store.query("MAEU1234567").await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status_code, "FALLBACK");
}

#[tokio::test]
async fn test_malformed_payload_degrades_to_fallback() {
    let stub = axum::Router::new().fallback(|| async { "this is not json" });
    let addr = spawn_stub(stub).await;

    let pool = memory_pool().await;
    let tracker = tracker_against(addr, pool).await;

    let result = tracker.track_shipment("MAEU1234567", None).await.unwrap();

    assert!(result.is_fallback());
    assert!(result
        .degraded_reason
        .as_deref()
        .unwrap()
        .contains("maersk"));
}

#[tokio::test]
async fn test_successful_upstream_call_returns_live_result() {
    let stub = axum::Router::new().fallback(|| async {
        Json(json!({
            "containers": [{
                "containerNumber": "MAEU1234567",
                "transportStatus": "Vessel departed",
                "location": { "city": "Rotterdam", "country": "Netherlands" },
                "events": [
                    {
                        "eventDateTime": "2026-08-01T10:15:00Z",
                        "eventType": "GATE-IN",
                        "activity": "Gate in at origin terminal",
                        "location": { "city": "Algeciras", "country": "Spain" }
                    },
                    {
                        "eventDateTime": "2026-08-03T18:40:00Z",
                        "eventType": "LOAD",
                        "activity": "Loaded on vessel",
                        "location": { "city": "Algeciras", "country": "Spain" }
                    }
                ]
            }]
        }))
        .into_response()
    });
    let addr = spawn_stub(stub).await;

    let pool = memory_pool().await;
    let tracker = tracker_against(addr, pool.clone()).await;

    let result = tracker.track_shipment("MAEU1234567", None).await.unwrap();

    assert_eq!(result.provider, "maersk");
    assert!(!result.degraded);
    assert!(result.degraded_reason.is_none());
    assert_eq!(result.status, "Vessel departed");
    assert_eq!(result.events.len(), 2);
    // The raw upstream payload is retained for audit
    assert!(result.raw.get("containers").is_some());

    // Both live events were persisted in order
    let store = EventStore::new(pool);
    let events = store.query("MAEU1234567").await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].status_code, "GATE-IN");
    assert_eq!(events[1].status_code, "LOAD");
}

#[tokio::test]
async fn test_unreachable_upstream_degrades_to_fallback() {
    // Bind a listener to reserve a port, then drop it so nothing answers
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pool = memory_pool().await;
    let tracker = tracker_against(addr, pool).await;

    let result = tracker.track_shipment("MAEU1234567", None).await.unwrap();

    assert!(result.is_fallback());
    assert!(result.status.contains("could not be reached"));
}
