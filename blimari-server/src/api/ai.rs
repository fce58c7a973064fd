//! AI question and insight endpoints

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use blimari_common::api::ApiResponse;
use serde::Deserialize;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::services::gemini_client::{Insights, QuestionSet};
use crate::AppState;

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/api/ai/questions", post(generate_questions))
        .route("/api/ai/insights", post(generate_insights))
}

fn default_language() -> String {
    "pt-BR".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionsRequest {
    topic: String,
    #[serde(default = "default_language")]
    language: String,
}

/// POST /api/ai/questions
///
/// Question generation has no degraded mode: without a working model there
/// is nothing sensible to ask, so failures surface as a 500.
async fn generate_questions(
    State(state): State<AppState>,
    Json(request): Json<QuestionsRequest>,
) -> ApiResult<Json<ApiResponse<QuestionSet>>> {
    if request.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty".to_string()));
    }

    let gemini = state
        .gemini
        .as_ref()
        .ok_or_else(|| ApiError::Internal("AI service is not configured".to_string()))?;

    let questions = gemini
        .generate_questions(request.topic.trim(), &request.language)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to generate questions: {}", e)))?;

    Ok(Json(ApiResponse::ok(questions)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsightsRequest {
    topic: String,
    #[serde(default)]
    answers: Vec<String>,
    #[serde(default = "default_language")]
    language: String,
}

/// POST /api/ai/insights
///
/// Insights are decorative; a model failure degrades to a generic
/// encouragement with no recommended sources instead of an error.
async fn generate_insights(
    State(state): State<AppState>,
    Json(request): Json<InsightsRequest>,
) -> ApiResult<Json<ApiResponse<Insights>>> {
    if request.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("topic must not be empty".to_string()));
    }
    let topic = request.topic.trim();

    let insights = match &state.gemini {
        Some(gemini) => {
            match gemini
                .generate_insights(&request.answers, topic, &request.language)
                .await
            {
                Ok(insights) => insights,
                Err(e) => {
                    warn!(error = %e, "Insight generation failed, using fallback");
                    fallback_insights(topic)
                }
            }
        }
        None => fallback_insights(topic),
    };

    Ok(Json(ApiResponse::ok(insights)))
}

fn fallback_insights(topic: &str) -> Insights {
    Insights {
        insight_text: format!(
            "Vamos montar uma trilha personalizada sobre {} com base nas suas respostas!",
            topic
        ),
        recommended_sources: Vec::new(),
    }
}
