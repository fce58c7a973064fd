//! User and cultural profile database operations

use blimari_common::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{CulturalProfile, User};

/// Load a user by external identity id
pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<Option<User>> {
    let row = sqlx::query(
        "SELECT id, email, name, created_at, updated_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(user_from_row).transpose()
}

/// Insert a user row for an externally-authenticated identity
pub async fn create_user(
    pool: &SqlitePool,
    user_id: &str,
    email: Option<&str>,
    name: Option<&str>,
) -> Result<User> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO users (id, email, name, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(email)
    .bind(name)
    .bind(now.to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(User {
        id: user_id.to_string(),
        email: email.map(|s| s.to_string()),
        name: name.map(|s| s.to_string()),
        created_at: now,
        updated_at: now,
    })
}

/// Load the cultural profile attached to a user, if any
pub async fn get_cultural_profile(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<CulturalProfile>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, qloo_taste_id, preferences, communication_style,
               last_sync_at, created_at
        FROM cultural_profiles
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.map(profile_from_row).transpose()
}

/// Insert a cultural profile (1-to-1 with the user)
pub async fn create_cultural_profile(
    pool: &SqlitePool,
    profile: &CulturalProfile,
) -> Result<()> {
    let preferences = serde_json::to_string(&profile.preferences).map_err(|e| {
        blimari_common::Error::Internal(format!("Failed to serialize preferences: {}", e))
    })?;
    let communication_style =
        serde_json::to_string(&profile.communication_style).map_err(|e| {
            blimari_common::Error::Internal(format!(
                "Failed to serialize communication style: {}",
                e
            ))
        })?;

    sqlx::query(
        r#"
        INSERT INTO cultural_profiles (
            id, user_id, qloo_taste_id, preferences, communication_style,
            last_sync_at, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(profile.id.to_string())
    .bind(&profile.user_id)
    .bind(&profile.qloo_taste_id)
    .bind(preferences)
    .bind(communication_style)
    .bind(profile.last_sync_at.to_rfc3339())
    .bind(profile.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

fn user_from_row(row: sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

fn profile_from_row(row: sqlx::sqlite::SqliteRow) -> Result<CulturalProfile> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| blimari_common::Error::Internal(format!("Invalid profile id: {}", e)))?;

    let preferences: String = row.get("preferences");
    let preferences = serde_json::from_str(&preferences)
        .map_err(|e| blimari_common::Error::Internal(format!("Invalid preferences JSON: {}", e)))?;

    let communication_style: String = row.get("communication_style");
    let communication_style = serde_json::from_str(&communication_style).map_err(|e| {
        blimari_common::Error::Internal(format!("Invalid communication style JSON: {}", e))
    })?;

    Ok(CulturalProfile {
        id,
        user_id: row.get("user_id"),
        qloo_taste_id: row.get("qloo_taste_id"),
        preferences,
        communication_style,
        last_sync_at: parse_timestamp(row.get("last_sync_at"))?,
        created_at: parse_timestamp(row.get("created_at"))?,
    })
}

pub(crate) fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| blimari_common::Error::Internal(format!("Failed to parse timestamp: {}", e)))
}
