//! Learning path endpoints

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use blimari_common::api::ApiResponse;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::api::users::ensure_user;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{ContentItem, LearningPath, OrganizedTrail, PathStatus};
use crate::AppState;

pub fn path_routes() -> Router<AppState> {
    Router::new()
        .route("/api/learning-paths/save", post(save_path))
        .route("/api/learning-paths", get(list_paths))
        .route("/api/learning-paths/progress", post(update_progress))
        .route("/api/learning-paths/next-lesson", get(next_lesson))
        .route("/api/learning-paths/:id", get(get_path))
        .route(
            "/api/learning-paths/:id/content/:content_id",
            get(get_content_item),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavePathRequest {
    topic: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    description: Option<String>,
    content: Vec<ContentItem>,
    #[serde(default)]
    organized_trail: Option<OrganizedTrail>,
}

/// POST /api/learning-paths/save
async fn save_path(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SavePathRequest>,
) -> ApiResult<Json<ApiResponse<LearningPath>>> {
    if request.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty".to_string()));
    }
    let topic = request.topic.trim().to_string();

    ensure_user(&state, &user).await?;

    let now = Utc::now();
    let path = LearningPath {
        id: Uuid::new_v4(),
        user_id: user.user_id,
        title: request
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| format!("Trilha de {}", topic)),
        difficulty: request
            .difficulty
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "beginner".to_string()),
        description: request
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| {
                format!("Uma trilha de aprendizado personalizada sobre {}.", topic)
            }),
        topic,
        total_content: request.content.len() as i64,
        completed_content: 0,
        progress: 0,
        status: PathStatus::Active,
        organized_trail: request.organized_trail,
        content: request.content,
        created_at: now,
        updated_at: now,
    };

    db::paths::create_learning_path(&state.db, &path).await?;

    Ok(Json(ApiResponse::ok_with_message(
        path,
        "Learning path saved",
    )))
}

/// GET /api/learning-paths
async fn list_paths(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<LearningPath>>>> {
    let paths = db::paths::get_paths_by_user(&state.db, &user.user_id).await?;
    Ok(Json(ApiResponse::ok(paths)))
}

/// GET /api/learning-paths/:id
async fn get_path(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<LearningPath>>> {
    let id = parse_path_id(&id)?;
    let path = db::paths::get_path(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Learning path not found: {}", id)))?;
    Ok(Json(ApiResponse::ok(path)))
}

/// GET /api/learning-paths/:id/content/:content_id
async fn get_content_item(
    State(state): State<AppState>,
    Path((id, content_id)): Path<(String, String)>,
) -> ApiResult<Json<ApiResponse<ContentItem>>> {
    let path_id = parse_path_id(&id)?;

    let item = db::paths::get_content_item(&state.db, path_id, &content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Content item not found: {}", content_id)))?;
    Ok(Json(ApiResponse::ok(item)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressRequest {
    learning_path_id: String,
    content_id: String,
    is_completed: bool,
}

/// POST /api/learning-paths/progress
///
/// Marks one content item and returns the path with recomputed progress.
async fn update_progress(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(request): Json<ProgressRequest>,
) -> ApiResult<Json<ApiResponse<LearningPath>>> {
    let path_id = parse_path_id(&request.learning_path_id)?;

    db::paths::set_content_completion(
        &state.db,
        path_id,
        &request.content_id,
        request.is_completed,
    )
    .await?;
    db::paths::recompute_progress(&state.db, path_id).await?;

    let path = db::paths::get_path(&state.db, path_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Learning path not found: {}", path_id)))?;

    Ok(Json(ApiResponse::ok(path)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NextLesson {
    learning_path_id: Uuid,
    content: ContentItem,
}

/// GET /api/learning-paths/next-lesson
///
/// `data` is null when the user has no uncompleted lessons.
async fn next_lesson(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Option<NextLesson>>>> {
    let next = db::paths::find_next_lesson(&state.db, &user.user_id)
        .await?
        .map(|(learning_path_id, content)| NextLesson {
            learning_path_id,
            content,
        });

    let response = match next {
        Some(lesson) => ApiResponse::ok(Some(lesson)),
        None => ApiResponse::ok_with_message(None, "No uncompleted lessons"),
    };

    Ok(Json(response))
}

fn parse_path_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid learning path id: {}", id)))
}
