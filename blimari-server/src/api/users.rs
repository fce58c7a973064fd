//! User sync endpoint

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use blimari_common::api::ApiResponse;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::db;
use crate::error::ApiResult;
use crate::models::{CulturalProfile, User};
use crate::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/api/user/sync", post(sync_user))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SyncRequest {
    /// Free-text interests used to seed the cultural profile
    #[serde(default)]
    interests: Vec<String>,
}

/// POST /api/user/sync
///
/// Creates the local user row for the externally-authenticated identity if
/// it doesn't exist yet, then tries to attach a Qloo cultural profile.
/// Profile creation is best-effort: any failure is logged and the sync
/// still succeeds.
async fn sync_user(
    State(state): State<AppState>,
    user: AuthUser,
    request: Option<Json<SyncRequest>>,
) -> ApiResult<Json<ApiResponse<User>>> {
    let record = ensure_user(&state, &user).await?;
    let Json(request) = request.unwrap_or_default();

    sync_cultural_profile(&state, &record.id, &request.interests).await;

    Ok(Json(ApiResponse::ok(record)))
}

/// Create the local user row on first authenticated request
pub(crate) async fn ensure_user(state: &AppState, user: &AuthUser) -> ApiResult<User> {
    if let Some(existing) = db::users::get_user(&state.db, &user.user_id).await? {
        return Ok(existing);
    }

    info!(user_id = %user.user_id, "Creating local user row");
    Ok(db::users::create_user(
        &state.db,
        &user.user_id,
        user.email.as_deref(),
        user.name.as_deref(),
    )
    .await?)
}

async fn sync_cultural_profile(state: &AppState, user_id: &str, interests: &[String]) {
    let Some(qloo) = &state.qloo else {
        return;
    };
    if interests.is_empty() {
        return;
    }

    match db::users::get_cultural_profile(&state.db, user_id).await {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Failed to check cultural profile");
            return;
        }
    }

    let taste = match qloo.fetch_taste_profile(interests).await {
        Ok(taste) => taste,
        Err(e) => {
            warn!(user_id = %user_id, error = %e, "Qloo taste lookup failed, skipping profile");
            return;
        }
    };

    let now = Utc::now();
    let profile = CulturalProfile {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        qloo_taste_id: taste.taste_id,
        preferences: taste.preferences,
        communication_style: taste.communication_style,
        last_sync_at: now,
        created_at: now,
    };

    if let Err(e) = db::users::create_cultural_profile(&state.db, &profile).await {
        warn!(user_id = %user_id, error = %e, "Failed to save cultural profile");
    } else {
        info!(user_id = %user_id, "Cultural profile created");
    }
}
