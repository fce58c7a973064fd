//! Learning path and path content database operations
//!
//! `create_learning_path` inserts the path row and all content rows in one
//! transaction: all rows or none. Progress is never written directly by
//! callers; it is recomputed from child completion flags via
//! `recompute_progress`.

use blimari_common::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{ContentItem, LearningPath, OrganizedTrail, PathStatus};

use super::users::parse_timestamp;

/// Insert a learning path and its content rows atomically
pub async fn create_learning_path(pool: &SqlitePool, path: &LearningPath) -> Result<()> {
    let organized_trail = path
        .organized_trail
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| {
            blimari_common::Error::Internal(format!("Failed to serialize trail: {}", e))
        })?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO learning_paths (
            id, user_id, title, topic, difficulty, description,
            total_content, completed_content, progress, status,
            organized_trail, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(path.id.to_string())
    .bind(&path.user_id)
    .bind(&path.title)
    .bind(&path.topic)
    .bind(&path.difficulty)
    .bind(&path.description)
    .bind(path.total_content)
    .bind(path.completed_content)
    .bind(path.progress)
    .bind(path.status.as_str())
    .bind(organized_trail)
    .bind(path.created_at.to_rfc3339())
    .bind(path.updated_at.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    for (order_index, item) in path.content.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO path_content (
                id, path_id, title, description, url, source, content_type,
                duration_minutes, author, rating, thumbnail, order_index,
                is_completed, completed_at, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?)
            "#,
        )
        .bind(&item.id)
        .bind(path.id.to_string())
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.url)
        .bind(item.source.as_str())
        .bind(item.content_type.as_str())
        .bind(item.duration_minutes.map(|d| d as i64))
        .bind(&item.author)
        .bind(item.rating)
        .bind(&item.thumbnail)
        .bind(order_index as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// List a user's learning paths, most recently updated first (no content rows)
pub async fn get_paths_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<LearningPath>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, title, topic, difficulty, description,
               total_content, completed_content, progress, status,
               organized_trail, created_at, updated_at
        FROM learning_paths
        WHERE user_id = ?
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| path_from_row(row, Vec::new()))
        .collect()
}

/// Load one learning path with its content rows in presentation order
pub async fn get_path(pool: &SqlitePool, path_id: Uuid) -> Result<Option<LearningPath>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, title, topic, difficulty, description,
               total_content, completed_content, progress, status,
               organized_trail, created_at, updated_at
        FROM learning_paths
        WHERE id = ?
        "#,
    )
    .bind(path_id.to_string())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let content = get_content_by_path(pool, path_id).await?;
    Ok(Some(path_from_row(row, content)?))
}

/// Content rows for a path, ordered by order_index
pub async fn get_content_by_path(pool: &SqlitePool, path_id: Uuid) -> Result<Vec<ContentItem>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, description, url, source, content_type,
               duration_minutes, author, rating, thumbnail, is_completed
        FROM path_content
        WHERE path_id = ?
        ORDER BY order_index ASC
        "#,
    )
    .bind(path_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(content_from_row).collect()
}

/// Load one content item within a path
///
/// Content ids are external identifiers and recur across paths, so lookups
/// are always path-scoped.
pub async fn get_content_item(
    pool: &SqlitePool,
    path_id: Uuid,
    content_id: &str,
) -> Result<Option<ContentItem>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, description, url, source, content_type,
               duration_minutes, author, rating, thumbnail, is_completed
        FROM path_content
        WHERE path_id = ? AND id = ?
        "#,
    )
    .bind(path_id.to_string())
    .bind(content_id)
    .fetch_optional(pool)
    .await?;

    row.map(content_from_row).transpose()
}

/// Flip one content row's completion flag and timestamp
pub async fn set_content_completion(
    pool: &SqlitePool,
    path_id: Uuid,
    content_id: &str,
    completed: bool,
) -> Result<()> {
    let completed_at = completed.then(|| Utc::now().to_rfc3339());

    let result = sqlx::query(
        "UPDATE path_content SET is_completed = ?, completed_at = ? WHERE path_id = ? AND id = ?",
    )
    .bind(completed as i64)
    .bind(completed_at)
    .bind(path_id.to_string())
    .bind(content_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(blimari_common::Error::NotFound(format!(
            "Content item not found: {}",
            content_id
        )));
    }

    Ok(())
}

/// Recompute a path's progress from its child completion flags
///
/// `progress = round(100 * completed / total)`, 0 when the path has no
/// content. Idempotent: repeated calls without intervening completion
/// changes produce the same result.
pub async fn recompute_progress(pool: &SqlitePool, path_id: Uuid) -> Result<i64> {
    let (total, completed): (i64, i64) = {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(is_completed), 0) AS completed
            FROM path_content
            WHERE path_id = ?
            "#,
        )
        .bind(path_id.to_string())
        .fetch_one(pool)
        .await?;
        (row.get("total"), row.get("completed"))
    };

    let progress = crate::models::progress_percentage(completed, total);
    let status = if total > 0 && completed == total {
        PathStatus::Completed
    } else {
        PathStatus::Active
    };

    sqlx::query(
        r#"
        UPDATE learning_paths
        SET progress = ?, completed_content = ?, status = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(progress)
    .bind(completed)
    .bind(status.as_str())
    .bind(Utc::now().to_rfc3339())
    .bind(path_id.to_string())
    .execute(pool)
    .await?;

    Ok(progress)
}

/// First uncompleted content item across the user's paths
///
/// Paths are visited most recently updated first; within a path, items in
/// presentation order.
pub async fn find_next_lesson(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<(Uuid, ContentItem)>> {
    let row = sqlx::query(
        r#"
        SELECT c.id, c.title, c.description, c.url, c.source, c.content_type,
               c.duration_minutes, c.author, c.rating, c.thumbnail,
               c.is_completed, c.path_id
        FROM path_content c
        JOIN learning_paths p ON p.id = c.path_id
        WHERE p.user_id = ? AND c.is_completed = 0
        ORDER BY p.updated_at DESC, c.order_index ASC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let path_id: String = row.get("path_id");
            let path_id = Uuid::parse_str(&path_id)
                .map_err(|e| blimari_common::Error::Internal(format!("Invalid path id: {}", e)))?;
            let item = content_from_row(row)?;
            Ok(Some((path_id, item)))
        }
        None => Ok(None),
    }
}

fn path_from_row(row: sqlx::sqlite::SqliteRow, content: Vec<ContentItem>) -> Result<LearningPath> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| blimari_common::Error::Internal(format!("Invalid path id: {}", e)))?;

    let status: String = row.get("status");
    let status = status
        .parse::<PathStatus>()
        .map_err(blimari_common::Error::Internal)?;

    let organized_trail: Option<String> = row.get("organized_trail");
    let organized_trail: Option<OrganizedTrail> = organized_trail
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| blimari_common::Error::Internal(format!("Invalid trail JSON: {}", e)))?;

    Ok(LearningPath {
        id,
        user_id: row.get("user_id"),
        title: row.get("title"),
        topic: row.get("topic"),
        difficulty: row.get("difficulty"),
        description: row.get("description"),
        total_content: row.get("total_content"),
        completed_content: row.get("completed_content"),
        progress: row.get("progress"),
        status,
        organized_trail,
        content,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

fn content_from_row(row: sqlx::sqlite::SqliteRow) -> Result<ContentItem> {
    let source: String = row.get("source");
    let source = source
        .parse()
        .map_err(blimari_common::Error::Internal)?;

    let content_type: String = row.get("content_type");
    let content_type = content_type
        .parse()
        .map_err(blimari_common::Error::Internal)?;

    let duration_minutes: Option<i64> = row.get("duration_minutes");
    let is_completed: i64 = row.get("is_completed");

    Ok(ContentItem {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        url: row.get("url"),
        source,
        content_type,
        duration_minutes: duration_minutes.map(|d| d as u32),
        author: row.get("author"),
        rating: row.get("rating"),
        thumbnail: row.get("thumbnail"),
        approved: true,
        completed: is_completed != 0,
    })
}
