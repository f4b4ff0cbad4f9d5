//! Append-only tracking event persistence
//!
//! Events are the only durable state in the aggregator. No updates, no
//! deletes; history for a tracking number only grows. Insertion order (the
//! autoincrement key) is the retrieval order, which keeps audit trails
//! consistent even when upstream timestamps arrive out of order.

use shiptrack_common::{time, Result, TrackingEvent};
use sqlx::{Row, SqlitePool};

/// Event store backed by the shared SQLite pool
#[derive(Clone)]
pub struct EventStore {
    pool: SqlitePool,
}

impl EventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one event for a tracking number
    pub async fn append(
        &self,
        tracking_number: &str,
        provider: &str,
        event: &TrackingEvent,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tracking_events (
                tracking_number, provider, status_code, location,
                description, event_time, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(tracking_number)
        .bind(provider)
        .bind(&event.status_code)
        .bind(&event.location)
        .bind(&event.description)
        .bind(event.timestamp.to_rfc3339())
        .bind(time::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All events for a tracking number, oldest receipt first
    pub async fn query(&self, tracking_number: &str) -> Result<Vec<TrackingEvent>> {
        let rows = sqlx::query(
            r#"
            SELECT status_code, location, description, event_time
            FROM tracking_events
            WHERE tracking_number = ?
            ORDER BY id
            "#,
        )
        .bind(tracking_number)
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_time: String = row.get("event_time");
            events.push(TrackingEvent {
                timestamp: time::parse_rfc3339(&event_time)?,
                location: row.get("location"),
                status_code: row.get("status_code"),
                description: row.get("description"),
            });
        }

        Ok(events)
    }
}
