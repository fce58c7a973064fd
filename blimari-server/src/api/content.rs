//! Step-by-step content endpoints
//!
//! Expose the discover/filter/organize steps individually so a client can
//! drive the flow itself instead of starting a server-side session. The
//! filter and organize handlers carry the same lenient fallbacks the
//! pipeline uses.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use blimari_common::api::ApiResponse;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::models::{ContentItem, ContentSource, OrganizedTrail};
use crate::services::CurationRequest;
use crate::AppState;

pub fn content_routes() -> Router<AppState> {
    Router::new()
        .route("/api/content/discover", post(discover))
        .route("/api/content/filter", post(filter))
        .route("/api/content/organize", post(organize))
}

fn default_language() -> String {
    "pt-BR".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscoverRequest {
    topic: String,
    sources: Vec<ContentSource>,
}

/// POST /api/content/discover
async fn discover(
    State(state): State<AppState>,
    Json(request): Json<DiscoverRequest>,
) -> ApiResult<Json<ApiResponse<Vec<ContentItem>>>> {
    if request.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty".to_string()));
    }

    let items = state
        .discovery
        .discover(request.topic.trim(), &request.sources)
        .await;

    Ok(Json(ApiResponse::ok(items)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterRequest {
    content_list: Vec<ContentItem>,
    topic: String,
    #[serde(default)]
    answers: Vec<String>,
    #[serde(default = "default_language")]
    language: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FilterResponse {
    approved_content_ids: Vec<String>,
}

/// POST /api/content/filter
///
/// A curation failure approves everything; a trail with too much content
/// beats a trail with none.
async fn filter(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> ApiResult<Json<ApiResponse<FilterResponse>>> {
    let curation = CurationRequest {
        topic: &request.topic,
        answers: &request.answers,
        language: &request.language,
        cultural_context: None,
    };

    let approved_content_ids = match state
        .curator
        .filter(&request.content_list, &curation)
        .await
    {
        Ok(ids) => ids,
        Err(e) => {
            warn!(error = %e, "Filter failed, approving all content");
            request
                .content_list
                .iter()
                .map(|item| item.id.clone())
                .collect()
        }
    };

    Ok(Json(ApiResponse::ok(FilterResponse {
        approved_content_ids,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganizeRequest {
    content_list: Vec<ContentItem>,
    topic: String,
    #[serde(default)]
    answers: Vec<String>,
    #[serde(default = "default_language")]
    language: String,
}

/// POST /api/content/organize
///
/// A curation failure produces a single section holding every item in its
/// incoming order.
async fn organize(
    State(state): State<AppState>,
    Json(request): Json<OrganizeRequest>,
) -> ApiResult<Json<ApiResponse<OrganizedTrail>>> {
    let curation = CurationRequest {
        topic: &request.topic,
        answers: &request.answers,
        language: &request.language,
        cultural_context: None,
    };

    let trail = match state
        .curator
        .organize(&request.content_list, &curation)
        .await
    {
        Ok(trail) => trail,
        Err(e) => {
            warn!(error = %e, "Organize failed, using single-section fallback");
            OrganizedTrail::single_section(
                "Trilha Completa",
                request
                    .content_list
                    .iter()
                    .map(|item| (item.id.clone(), item.description.clone())),
            )
        }
    };

    Ok(Json(ApiResponse::ok(trail)))
}
