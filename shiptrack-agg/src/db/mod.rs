//! Database access for shiptrack-agg

pub mod events;

pub use events::EventStore;

use shiptrack_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the tracking tables if they don't exist
///
/// `tracking_events` is append-only: the autoincrement `id` is the
/// receipt-order key that `query` sorts by, independent of upstream event
/// timestamps.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tracking_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tracking_number TEXT NOT NULL,
            provider TEXT NOT NULL,
            status_code TEXT NOT NULL,
            location TEXT NOT NULL,
            description TEXT NOT NULL,
            event_time TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_tracking_events_number ON tracking_events (tracking_number)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (tracking_events)");

    Ok(())
}
