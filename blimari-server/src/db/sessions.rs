//! Trail session database operations
//!
//! Session state is persisted after every transition so progress survives
//! a status poll from any client. The full session is stored as JSON with a
//! few indexed columns for querying.

use blimari_common::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{SessionState, TrailSession};

/// Save (upsert) a trail session
pub async fn save_session(pool: &SqlitePool, session: &TrailSession) -> Result<()> {
    let state = serde_json::to_string(&session.state)
        .map_err(|e| blimari_common::Error::Internal(format!("Failed to serialize state: {}", e)))?;
    let payload = serde_json::to_string(session).map_err(|e| {
        blimari_common::Error::Internal(format!("Failed to serialize session: {}", e))
    })?;

    sqlx::query(
        r#"
        INSERT INTO trail_sessions (
            session_id, user_id, state, payload, percentage,
            current_operation, learning_path_id, started_at, ended_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(session_id) DO UPDATE SET
            state = excluded.state,
            payload = excluded.payload,
            percentage = excluded.percentage,
            current_operation = excluded.current_operation,
            learning_path_id = excluded.learning_path_id,
            ended_at = excluded.ended_at
        "#,
    )
    .bind(session.session_id.to_string())
    .bind(&session.user_id)
    .bind(&state)
    .bind(&payload)
    .bind(session.percentage)
    .bind(&session.current_operation)
    .bind(session.learning_path_id.map(|id| id.to_string()))
    .bind(session.started_at.to_rfc3339())
    .bind(session.ended_at.map(|dt| dt.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a trail session by id
pub async fn load_session(pool: &SqlitePool, session_id: Uuid) -> Result<Option<TrailSession>> {
    let row = sqlx::query("SELECT payload FROM trail_sessions WHERE session_id = ?")
        .bind(session_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let payload: String = row.get("payload");
            let session = serde_json::from_str(&payload).map_err(|e| {
                blimari_common::Error::Internal(format!("Failed to deserialize session: {}", e))
            })?;
            Ok(Some(session))
        }
        None => Ok(None),
    }
}

/// Whether the user already has a non-terminal session
///
/// Enforces single-flight at the API boundary: one running pipeline per
/// user at a time.
pub async fn has_running_session(pool: &SqlitePool, user_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM trail_sessions
        WHERE user_id = ? AND state NOT IN ('"COMPLETED"', '"FAILED"')
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Mark sessions left over from a previous process run as failed
///
/// A non-terminal session without its background task will never progress;
/// the task died with the process. Sessions are rewritten through
/// `save_session` so the payload (what status polls read) changes along
/// with the indexed columns.
pub async fn cleanup_stale_sessions(pool: &SqlitePool) -> Result<usize> {
    let rows = sqlx::query(
        r#"
        SELECT payload
        FROM trail_sessions
        WHERE state NOT IN ('"COMPLETED"', '"FAILED"')
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut count = 0;
    for row in rows {
        let payload: String = row.get("payload");
        let mut session: TrailSession = serde_json::from_str(&payload).map_err(|e| {
            blimari_common::Error::Internal(format!("Failed to deserialize session: {}", e))
        })?;

        session.current_operation =
            String::from("Trail generation interrupted by server restart");
        session.transition_to(SessionState::Failed);
        save_session(pool, &session).await?;
        count += 1;
    }

    Ok(count)
}
