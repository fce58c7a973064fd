//! Qloo taste API client
//!
//! Builds a cultural taste profile from a user's interests. Qloo is a
//! best-effort enrichment: callers fall back to a neutral 0.5 affinity and
//! an empty profile when the API is unavailable.

use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "https://hackathon.api.qloo.com";

/// Neutral affinity used when Qloo gives no signal
pub const NEUTRAL_AFFINITY: f64 = 0.5;

/// Qloo client errors
#[derive(Debug, Error)]
pub enum QlooError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Taste profile derived from Qloo insights
#[derive(Debug, Clone)]
pub struct TasteProfile {
    pub taste_id: Option<String>,
    pub preferences: Value,
    pub communication_style: Value,
}

/// Qloo insights API client
pub struct QlooClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl QlooClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, QlooError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| QlooError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Build a taste profile from the user's stated interests
    pub async fn fetch_taste_profile(
        &self,
        interests: &[String],
    ) -> Result<TasteProfile, QlooError> {
        tracing::debug!(interests = interests.len(), "Querying Qloo insights");

        let url = format!("{}/v2/insights", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("filter.type", "urn:entity:book"),
                ("signal.interests.query", &interests.join(",")),
            ])
            .send()
            .await
            .map_err(|e| QlooError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(QlooError::ApiError(status.as_u16(), error_text));
        }

        let insights: InsightsResponse = response
            .json()
            .await
            .map_err(|e| QlooError::ParseError(e.to_string()))?;

        let entities = insights.results.entities;
        let taste_id = entities.first().and_then(|e| e.entity_id.clone());
        let preferences = json!({
            "interests": interests,
            "relatedEntities": entities
                .iter()
                .map(|e| json!({"name": e.name, "affinity": e.affinity()}))
                .collect::<Vec<_>>(),
        });

        Ok(TasteProfile {
            taste_id,
            preferences,
            communication_style: json!({"tone": "encouraging"}),
        })
    }
}

#[derive(Debug, Deserialize)]
struct InsightsResponse {
    #[serde(default)]
    results: InsightsResults,
}

#[derive(Debug, Default, Deserialize)]
struct InsightsResults {
    #[serde(default)]
    entities: Vec<Entity>,
}

#[derive(Debug, Deserialize)]
struct Entity {
    name: Option<String>,
    entity_id: Option<String>,
    query: Option<EntityQuery>,
}

#[derive(Debug, Deserialize)]
struct EntityQuery {
    affinity: Option<f64>,
}

impl Entity {
    fn affinity(&self) -> f64 {
        self.query
            .as_ref()
            .and_then(|q| q.affinity)
            .unwrap_or(NEUTRAL_AFFINITY)
    }
}
