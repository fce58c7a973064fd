//! Gemini generative API client
//!
//! Wraps the Generative Language REST API with four typed operations:
//! onboarding questions, source insights, content filtering, and trail
//! organization. Every operation requests `application/json` output and
//! deserializes the model's text into a strict schema; a schema mismatch is
//! the same failure class as a network error, so callers apply the same
//! fallback either way.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ContentItem, ContentSource, OrganizedTrail};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const GEMINI_MODEL: &str = "gemini-2.5-flash-lite";

/// Gemini client errors
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    /// Model output did not conform to the expected schema
    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

/// AI-generated onboarding question set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
    pub topic: String,
    pub questions: Vec<TrailQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailQuestion {
    pub id: u32,
    pub question: String,
    pub description: String,
    pub category: QuestionCategory,
    pub options: Vec<QuestionOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Experience,
    LearningStyle,
    Goal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    pub description: String,
    /// 1 (beginner/low intensity) to 5 (expert/high intensity)
    pub weight: u8,
}

/// Personalized insight over the user's answers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub insight_text: String,
    pub recommended_sources: Vec<ContentSource>,
}

/// Filter step decision
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDecision {
    pub approved_content_ids: Vec<String>,
}

/// Gemini API client
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, GeminiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }

    /// Generate exactly 3 onboarding questions for a topic
    pub async fn generate_questions(
        &self,
        topic: &str,
        language: &str,
    ) -> Result<QuestionSet, GeminiError> {
        let prompt = format!(
            r#"You are an expert in education and learning personalization. A user wants to learn about "{topic}".
The user's language is {language}.

Create EXACTLY 3 strategic questions to personalize the learning path about "{topic}":

1. category "experience": discover the current level of knowledge. 3 options
   (beginner, intermediate, advanced), each with a weight from 1 to 5.
2. category "learning_style": identify how the person learns best. 3 options
   (visual/practical, theoretical/conceptual, hands-on/projects), weight 1-5.
3. category "goal": understand the motivation. 3 options (career, personal
   interest, academic/certification), weight 1-5.

Rules: be specific to "{topic}", keep questions direct, write questions and
options in {language}.

Respond ONLY with valid JSON in this exact shape:
{{
  "topic": "{topic}",
  "questions": [
    {{
      "id": 1,
      "question": "...",
      "description": "...",
      "category": "experience",
      "options": [
        {{"id": "beginner", "text": "...", "description": "...", "weight": 1}}
      ]
    }}
  ]
}}"#
        );

        self.generate_object(&prompt).await
    }

    /// Summarize the user's answers and recommend content sources
    pub async fn generate_insights(
        &self,
        answers: &[String],
        topic: &str,
        language: &str,
    ) -> Result<Insights, GeminiError> {
        let prompt = format!(
            r#"A user answered an onboarding questionnaire about learning "{topic}".
Answers: {answers}
The user's language is {language}.

Write one short, motivating insight (max 40 words, in {language}) about how
this user should approach learning "{topic}", and recommend which content
sources fit them best. Allowed source values: "youtube", "github", "web",
"books".

Respond ONLY with valid JSON:
{{"insightText": "...", "recommendedSources": ["youtube", "web"]}}"#,
            answers = serde_json::to_string(answers).unwrap_or_default(),
        );

        self.generate_object(&prompt).await
    }

    /// Select the subset of discovered items worth keeping
    pub async fn filter_content(
        &self,
        items: &[ContentItem],
        topic: &str,
        answers: &[String],
        cultural_context: Option<&str>,
    ) -> Result<FilterDecision, GeminiError> {
        let content_list: Vec<_> = items
            .iter()
            .map(|item| {
                json!({
                    "id": item.id,
                    "title": item.title,
                    "description": truncate(&item.description, 500),
                    "source": item.source,
                    "type": item.content_type,
                    "duration": item.duration_minutes,
                    "author": item.author,
                    "rating": item.rating,
                })
            })
            .collect();

        let prompt = format!(
            r#"You are curating a learning path about "{topic}".
User onboarding answers: {answers}
{context}
Candidate content list:
{content}

Select the items that are genuinely relevant and high quality for this user.
Keep items that teach "{topic}" at an appropriate level; drop duplicates,
off-topic results, and low-effort content.

Respond ONLY with valid JSON:
{{"approvedContentIds": ["id1", "id2"]}}"#,
            answers = serde_json::to_string(answers).unwrap_or_default(),
            context = cultural_context.unwrap_or(""),
            content = serde_json::to_string(&content_list).unwrap_or_default(),
        );

        self.generate_object(&prompt).await
    }

    /// Group and order approved items into a sectioned trail
    pub async fn organize_trail(
        &self,
        items: &[ContentItem],
        topic: &str,
        answers: &[String],
        language: &str,
        cultural_context: Option<&str>,
    ) -> Result<OrganizedTrail, GeminiError> {
        let content_list: Vec<_> = items
            .iter()
            .map(|item| {
                json!({
                    "id": item.id,
                    "title": item.title,
                    "description": truncate(&item.description, 500),
                    "url": item.url,
                    "source": item.source,
                    "type": item.content_type,
                    "duration": item.duration_minutes,
                    "author": item.author,
                    "rating": item.rating,
                    "thumbnail": item.thumbnail,
                })
            })
            .collect();

        let prompt = format!(
            r#"You are structuring a learning path about "{topic}".
User onboarding answers: {answers}
{context}
Approved content:
{content}

Group these items into a logical learning sequence: 2-4 sections from
fundamentals to advanced material. Every input id must appear exactly once.
For each item write a short description (max 30 words, in {language}) of what
the learner gets from it. Section titles in {language}.

Respond ONLY with valid JSON:
{{"organizedTrail": [{{"sectionTitle": "...", "items": [{{"id": "...", "organizedDescription": "..."}}]}}]}}"#,
            answers = serde_json::to_string(answers).unwrap_or_default(),
            context = cultural_context.unwrap_or(""),
            content = serde_json::to_string(&content_list).unwrap_or_default(),
        );

        self.generate_object(&prompt).await
    }

    /// Run one generateContent call and parse the model text into `T`
    async fn generate_object<T: serde::de::DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<T, GeminiError> {
        let text = self.generate_text(prompt).await?;
        serde_json::from_str(strip_code_fences(&text))
            .map_err(|e| GeminiError::SchemaError(e.to_string()))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, GEMINI_MODEL, self.api_key
        );

        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "temperature": 0.7,
                "responseMimeType": "application/json",
            }
        });

        tracing::debug!(model = GEMINI_MODEL, "Querying Gemini API");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeminiError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GeminiError::ApiError(status.as_u16(), error_text));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::SchemaError(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or(GeminiError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

/// Strip a markdown code fence the model sometimes wraps JSON in
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect::<String>() + "..."
    }
}
