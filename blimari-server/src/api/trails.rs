//! Trail-generation session endpoints
//!
//! POST spawns the pipeline as a background task and returns immediately
//! with 202; clients follow progress by polling the session or subscribing
//! to the SSE stream.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use blimari_common::api::ApiResponse;
use blimari_common::sse::trail_event_stream;
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::error;
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::api::users::ensure_user;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{ContentSource, TrailSession};
use crate::AppState;

pub fn trail_routes() -> Router<AppState> {
    Router::new()
        .route("/api/trails/generate", post(generate_trail))
        .route("/api/trails/sessions/:id", get(get_session))
        .route("/api/trails/events", get(trail_events))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    topic: String,
    sources: Vec<ContentSource>,
    #[serde(default)]
    answers: Vec<String>,
    #[serde(default = "default_language")]
    language: String,
}

fn default_language() -> String {
    "pt-BR".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    session_id: Uuid,
}

/// POST /api/trails/generate
///
/// One running session per user: a second generate call while a session is
/// in flight gets a 409.
async fn generate_trail(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<GenerateResponse>>)> {
    if request.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty".to_string()));
    }

    ensure_user(&state, &user).await?;

    if db::sessions::has_running_session(&state.db, &user.user_id).await? {
        return Err(ApiError::Conflict(
            "A trail generation is already running for this user".to_string(),
        ));
    }

    let session = TrailSession::new(
        user.user_id,
        request.topic.trim().to_string(),
        request.sources,
        request.answers,
        request.language,
    );
    let session_id = session.session_id;

    // Persist the idle session before answering so a status poll racing the
    // background task still finds it.
    db::sessions::save_session(&state.db, &session).await?;

    let orchestrator = state.orchestrator();
    tokio::spawn(async move {
        if let Err(e) = orchestrator.execute(session).await {
            error!(session_id = %session_id, error = %e, "Trail generation task failed");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(GenerateResponse { session_id })),
    ))
}

/// GET /api/trails/sessions/:id
async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<TrailSession>>> {
    let session_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid session id: {}", id)))?;

    let session = db::sessions::load_session(&state.db, session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session not found: {}", session_id)))?;

    Ok(Json(ApiResponse::ok(session)))
}

/// GET /api/trails/events
async fn trail_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    trail_event_stream(&state.event_bus)
}
