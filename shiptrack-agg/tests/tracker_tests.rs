//! Dispatcher and event store integration tests
//!
//! All adapters here are unconfigured (no credentials), so every classified
//! identifier degrades to a fallback result without touching the network.

use chrono::{TimeZone, Utc};
use shiptrack_agg::db::EventStore;
use shiptrack_agg::providers::TrackError;
use shiptrack_agg::tracking::Tracker;
use shiptrack_common::config::ResolvedCredentials;
use shiptrack_common::{Modality, TrackingEvent};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

async fn memory_pool() -> SqlitePool {
    // Single connection so the in-memory database is shared
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

async fn unconfigured_tracker() -> (Tracker, EventStore) {
    let pool = memory_pool().await;
    let store = EventStore::new(pool.clone());
    let tracker = Tracker::from_credentials(&ResolvedCredentials::default(), store)
        .expect("tracker construction");
    (tracker, EventStore::new(pool))
}

fn sample_event(code: &str, minute: u32) -> TrackingEvent {
    TrackingEvent {
        timestamp: Utc.with_ymd_and_hms(2026, 8, 1, 12, minute, 0).unwrap(),
        location: format!("Location {}", code),
        status_code: code.to_string(),
        description: format!("Milestone {}", code),
    }
}

#[tokio::test]
async fn test_track_shipment_is_total_without_hint() {
    let (tracker, _) = unconfigured_tracker().await;

    for identifier in [
        "",
        " ",
        "garbage-id-###",
        "MAEU1234567",
        "1Z999AA10123456784",
        "CMDU123456789",
        "1234567890",
        "🚢",
        "a-very-long-identifier-that-matches-nothing-at-all-0123456789",
    ] {
        let result = tracker
            .track_shipment(identifier, None)
            .await
            .expect("total over strings without hint");
        assert_eq!(result.tracking_number, identifier);
        assert!(result.is_fallback());
        assert!(!result.status.is_empty());
    }
}

#[tokio::test]
async fn test_unrecognized_identifier_explains_itself() {
    let (tracker, _) = unconfigured_tracker().await;

    let result = tracker.track_shipment("garbage-id-###", None).await.unwrap();

    assert_eq!(result.provider, "fallback");
    assert!(result.degraded);
    assert!(result.status.contains("did not match any registered provider"));
    assert_eq!(
        result.degraded_reason.as_deref(),
        Some("unrecognized identifier")
    );
}

#[tokio::test]
async fn test_unknown_provider_hint_is_an_error() {
    let (tracker, _) = unconfigured_tracker().await;

    let err = tracker
        .track_shipment("MAEU1234567", Some("NonexistentProvider"))
        .await
        .unwrap_err();

    assert!(matches!(err, TrackError::UnknownProviderHint(_)));
}

#[tokio::test]
async fn test_provider_hint_is_case_insensitive() {
    let (tracker, _) = unconfigured_tracker().await;

    let result = tracker
        .track_shipment("MAEU1234567", Some("Maersk"))
        .await
        .expect("known hint, any casing");

    // Unconfigured provider, so the answer is a fallback attributed to it
    assert!(result.is_fallback());
    assert!(result.degraded_reason.unwrap().contains("maersk"));
}

#[tokio::test]
async fn test_missing_credential_yields_marked_fallback_with_event() {
    let (tracker, store) = unconfigured_tracker().await;

    let result = tracker.track_shipment("MAEU1234567", None).await.unwrap();

    assert_eq!(result.provider, "fallback");
    assert!(result.degraded);
    assert!(result.status.contains("not configured"));
    assert!(!result.events.is_empty());
    assert!(result.events[0]
        .description
        .contains("ISO 6346 container number"));

    // The synthetic event was persisted
    let persisted = store.query("MAEU1234567").await.unwrap();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].status_code, "FALLBACK");
}

#[tokio::test]
async fn test_unified_auto_routes_nine_digits_to_maritime() {
    let (tracker, _) = unconfigured_tracker().await;

    let result = tracker.track_unified("123456789", Modality::Auto).await;

    // The maritime adapter is unconfigured, so the fallback reason names it
    assert!(result.is_fallback());
    assert!(result.degraded_reason.unwrap().contains("aisfeed"));
}

#[tokio::test]
async fn test_unified_auto_routes_flight_numbers_to_aviation() {
    let (tracker, _) = unconfigured_tracker().await;

    let result = tracker.track_unified("AF1234", Modality::Auto).await;

    assert!(result.is_fallback());
    assert!(result.degraded_reason.unwrap().contains("aviationstack"));
}

#[tokio::test]
async fn test_unified_auto_defaults_to_ground() {
    let (tracker, _) = unconfigured_tracker().await;

    let result = tracker.track_unified("MAEU1234567", Modality::Auto).await;

    assert!(result.is_fallback());
    assert!(result.degraded_reason.unwrap().contains("maersk"));
}

#[tokio::test]
async fn test_unified_explicit_modality_skips_heuristics() {
    let (tracker, _) = unconfigured_tracker().await;

    // Nine digits would auto-route to maritime; an explicit aviation hint wins
    let result = tracker.track_unified("123456789", Modality::Aviation).await;

    assert!(result.is_fallback());
    assert!(result.degraded_reason.unwrap().contains("aviationstack"));
}

#[tokio::test]
async fn test_event_store_round_trip_preserves_fields() {
    let pool = memory_pool().await;
    let store = EventStore::new(pool);

    let events: Vec<TrackingEvent> = (0..5).map(|i| sample_event(&format!("E{}", i), i)).collect();
    for event in &events {
        store.append("MAEU1234567", "maersk", event).await.unwrap();
    }

    let queried = store.query("MAEU1234567").await.unwrap();
    assert_eq!(queried.len(), events.len());
    for (stored, original) in queried.iter().zip(events.iter()) {
        assert_eq!(stored, original);
    }
}

#[tokio::test]
async fn test_concurrent_appends_to_different_numbers_stay_ordered() {
    let pool = memory_pool().await;
    let store_a = EventStore::new(pool.clone());
    let store_b = EventStore::new(pool.clone());

    let task_a = tokio::spawn(async move {
        for i in 0..10 {
            store_a
                .append("AAAA1111111", "maersk", &sample_event(&format!("A{}", i), i))
                .await
                .unwrap();
        }
    });
    let task_b = tokio::spawn(async move {
        for i in 0..10 {
            store_b
                .append("1234567890", "dhl", &sample_event(&format!("B{}", i), i))
                .await
                .unwrap();
        }
    });
    task_a.await.unwrap();
    task_b.await.unwrap();

    let store = EventStore::new(pool);
    let events_a = store.query("AAAA1111111").await.unwrap();
    let events_b = store.query("1234567890").await.unwrap();

    let codes_a: Vec<String> = events_a.iter().map(|e| e.status_code.clone()).collect();
    let codes_b: Vec<String> = events_b.iter().map(|e| e.status_code.clone()).collect();
    assert_eq!(codes_a, (0..10).map(|i| format!("A{}", i)).collect::<Vec<_>>());
    assert_eq!(codes_b, (0..10).map(|i| format!("B{}", i)).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_repeated_calls_grow_history_append_only() {
    let (tracker, store) = unconfigured_tracker().await;

    tracker.track_shipment("MAEU1234567", None).await.unwrap();
    tracker.track_shipment("MAEU1234567", None).await.unwrap();
    tracker.track_shipment("MAEU1234567", None).await.unwrap();

    let events = store.query("MAEU1234567").await.unwrap();
    assert_eq!(events.len(), 3);
}
