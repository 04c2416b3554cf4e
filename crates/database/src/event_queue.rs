//! Durable queue backing the pipeline event bus.
//!
//! Events are appended as `pending`, claimed in insertion order as `running`,
//! and settled as `completed` or `failed`. Events left `running` by a crashed
//! process are put back with [`requeue_running`] on startup.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{new_id, EventRecord, EventStatus};

const EVENT_COLUMNS: &str =
    "id, name, payload, status, attempts, last_error, created_at, updated_at";

/// Append an event to the queue.
pub async fn enqueue(pool: &SqlitePool, name: &str, payload: &serde_json::Value) -> Result<EventRecord> {
    let id = new_id();
    sqlx::query(
        r#"
        INSERT INTO events (id, name, payload, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(Json(payload))
    .bind(EventStatus::Pending)
    .execute(pool)
    .await?;

    tracing::debug!(event_id = %id, name, "Event enqueued");

    get_event(pool, &id).await
}

/// Get an event by ID.
pub async fn get_event(pool: &SqlitePool, id: &str) -> Result<EventRecord> {
    let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?");
    sqlx::query_as::<_, EventRecord>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Event", id))
}

/// Claim up to `limit` pending events, oldest first, marking them `running`.
pub async fn claim_pending(pool: &SqlitePool, limit: i64) -> Result<Vec<EventRecord>> {
    let query = format!(
        r#"
        UPDATE events
        SET status = ?, updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id IN (
            SELECT id FROM events
            WHERE status = ?
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?
        )
        RETURNING {EVENT_COLUMNS}
        "#
    );
    let mut claimed = sqlx::query_as::<_, EventRecord>(&query)
        .bind(EventStatus::Running)
        .bind(EventStatus::Pending)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    // RETURNING order is unspecified
    claimed.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    Ok(claimed)
}

/// Settle a running event as completed.
pub async fn mark_completed(pool: &SqlitePool, id: &str, attempts: i64) -> Result<()> {
    settle(pool, id, EventStatus::Completed, attempts, None).await
}

/// Settle a running event as failed with the last handler error.
pub async fn mark_failed(pool: &SqlitePool, id: &str, attempts: i64, error: &str) -> Result<()> {
    settle(pool, id, EventStatus::Failed, attempts, Some(error)).await
}

async fn settle(
    pool: &SqlitePool,
    id: &str,
    status: EventStatus,
    attempts: i64,
    error: Option<&str>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE events
        SET status = ?, attempts = attempts + ?, last_error = ?,
            updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(attempts)
    .bind(error)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Event", id));
    }

    Ok(())
}

/// Put events stranded in `running` back to `pending`. Returns how many.
pub async fn requeue_running(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE events
        SET status = ?, updated_at = strftime('%Y-%m-%d %H:%M:%f', 'now')
        WHERE status = ?
        "#,
    )
    .bind(EventStatus::Pending)
    .bind(EventStatus::Running)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Number of events waiting to be claimed.
pub async fn pending_count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE status = ?")
        .bind(EventStatus::Pending)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Most recent events, newest first.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<EventRecord>> {
    let query = format!(
        "SELECT {EVENT_COLUMNS} FROM events ORDER BY created_at DESC, rowid DESC LIMIT ?"
    );
    let events = sqlx::query_as::<_, EventRecord>(&query)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(events)
}

/// Events with the given name, oldest first.
pub async fn list_by_name(pool: &SqlitePool, name: &str) -> Result<Vec<EventRecord>> {
    let query = format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE name = ? ORDER BY created_at ASC, rowid ASC"
    );
    let events = sqlx::query_as::<_, EventRecord>(&query)
        .bind(name)
        .fetch_all(pool)
        .await?;

    Ok(events)
}
