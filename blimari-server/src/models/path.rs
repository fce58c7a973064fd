//! Learning path model
//!
//! A learning path owns its content items (1-to-many, cascade on delete) and
//! at most one organized trail. `progress` is derived: it is always
//! `round(100 * completed_content / total_content)` and never independently
//! settable.

use super::{ContentItem, OrganizedTrail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a learning path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStatus {
    Active,
    Completed,
    Paused,
    Archived,
}

impl PathStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathStatus::Active => "active",
            PathStatus::Completed => "completed",
            PathStatus::Paused => "paused",
            PathStatus::Archived => "archived",
        }
    }
}

impl std::str::FromStr for PathStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PathStatus::Active),
            "completed" => Ok(PathStatus::Completed),
            "paused" => Ok(PathStatus::Paused),
            "archived" => Ok(PathStatus::Archived),
            other => Err(format!("unknown path status: {}", other)),
        }
    }
}

/// Persisted, user-owned curriculum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub topic: String,
    pub difficulty: String,
    pub description: String,
    pub total_content: i64,
    pub completed_content: i64,
    /// Derived percentage, recomputed from child completion flags
    pub progress: i64,
    pub status: PathStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organized_trail: Option<OrganizedTrail>,
    /// Content items, present when the path was loaded with children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Progress percentage from completion counts
///
/// Zero total yields zero progress (no division by zero).
pub fn progress_percentage(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_zero_for_empty_path() {
        assert_eq!(progress_percentage(0, 0), 0);
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        assert_eq!(progress_percentage(1, 3), 33);
        assert_eq!(progress_percentage(2, 3), 67);
        assert_eq!(progress_percentage(3, 3), 100);
    }

    #[test]
    fn progress_full_single_item() {
        assert_eq!(progress_percentage(0, 1), 0);
        assert_eq!(progress_percentage(1, 1), 100);
    }
}
