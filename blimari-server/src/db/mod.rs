//! Database access for blimari-server
//!
//! SQLite via sqlx. The schema is created on boot with idempotent
//! `CREATE TABLE IF NOT EXISTS` statements; `DATABASE_URL` supplies the
//! connection string.

pub mod paths;
pub mod sessions;
pub mod users;

use blimari_common::Result;
use sqlx::SqlitePool;

/// Initialize database connection pool and schema
pub async fn init_database_pool(database_url: &str) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", database_url);

    let pool = SqlitePool::connect(database_url).await?;

    // Child rows must go away with their learning path
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create application tables if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT,
            name TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cultural_profiles (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
            qloo_taste_id TEXT,
            preferences TEXT NOT NULL DEFAULT '{}',
            communication_style TEXT NOT NULL DEFAULT '{}',
            last_sync_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learning_paths (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id),
            title TEXT NOT NULL,
            topic TEXT NOT NULL,
            difficulty TEXT NOT NULL DEFAULT 'beginner',
            description TEXT NOT NULL DEFAULT '',
            total_content INTEGER NOT NULL DEFAULT 0,
            completed_content INTEGER NOT NULL DEFAULT 0,
            progress INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'active',
            organized_trail TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Content ids are external identifiers (video id, repo id, URL) and the
    // same item can be discovered into many paths, so rows are keyed per path.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS path_content (
            id TEXT NOT NULL,
            path_id TEXT NOT NULL REFERENCES learning_paths(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            url TEXT NOT NULL DEFAULT '',
            source TEXT NOT NULL,
            content_type TEXT NOT NULL,
            duration_minutes INTEGER,
            author TEXT,
            rating REAL,
            thumbnail TEXT,
            order_index INTEGER NOT NULL,
            is_completed INTEGER NOT NULL DEFAULT 0,
            completed_at TEXT,
            created_at TEXT NOT NULL,
            PRIMARY KEY (path_id, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trail_sessions (
            session_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            state TEXT NOT NULL,
            payload TEXT NOT NULL,
            percentage REAL NOT NULL DEFAULT 0.0,
            current_operation TEXT NOT NULL DEFAULT '',
            learning_path_id TEXT,
            started_at TEXT NOT NULL,
            ended_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!(
        "Database tables initialized (users, cultural_profiles, learning_paths, path_content, trail_sessions)"
    );

    Ok(())
}
