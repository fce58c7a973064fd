//! Health check endpoint

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::AppState;

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime_seconds = (Utc::now() - state.startup_time).num_seconds();
    let db_ok = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    Json(json!({
        "status": if db_ok { "healthy" } else { "degraded" },
        "service": "blimari-server",
        "database": if db_ok { "connected" } else { "unavailable" },
        "uptimeSeconds": uptime_seconds,
    }))
}
