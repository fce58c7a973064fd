//! User and cultural profile models
//!
//! User identity comes from an external auth provider; a local row is created
//! lazily on first authenticated request. The cultural profile is a 1-to-1
//! adjunct created best-effort and tolerated as absent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local record for an externally-authenticated user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identity supplied by the external auth provider
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cultural preference profile, used as auxiliary AI prompt context
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CulturalProfile {
    pub id: Uuid,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qloo_taste_id: Option<String>,
    pub preferences: serde_json::Value,
    pub communication_style: serde_json::Value,
    pub last_sync_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl CulturalProfile {
    /// Short free-text summary injected into AI prompts
    ///
    /// Returns None when the profile carries no usable preference data.
    pub fn prompt_context(&self) -> Option<String> {
        let prefs = serde_json::to_string(&self.preferences).ok()?;
        if prefs == "{}" || prefs == "null" {
            return None;
        }
        Some(format!("User cultural preferences: {}", prefs))
    }
}
