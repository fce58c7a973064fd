//! Organized trail structure
//!
//! The organize step returns a sectioned, ordered curriculum. The order in
//! this structure is authoritative: the orchestration layer must not re-sort
//! sections or items.

use serde::{Deserialize, Serialize};

/// Sectioned, ordered curriculum produced by the organize step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizedTrail {
    pub organized_trail: Vec<TrailSection>,
}

/// One titled group of trail items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailSection {
    pub section_title: String,
    pub items: Vec<TrailItem>,
}

/// Reference to a content item plus its rewritten description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailItem {
    /// Must reference an id present in the associated content list
    pub id: String,
    pub organized_description: String,
}

impl OrganizedTrail {
    /// Total item count across all sections
    pub fn item_count(&self) -> usize {
        self.organized_trail.iter().map(|s| s.items.len()).sum()
    }

    /// Build a single-section trail preserving the given item order
    ///
    /// This is the organize-step fallback: no items are dropped and the
    /// pre-organize order is kept.
    pub fn single_section(
        title: impl Into<String>,
        items: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            organized_trail: vec![TrailSection {
                section_title: title.into(),
                items: items
                    .into_iter()
                    .map(|(id, description)| TrailItem {
                        id,
                        organized_description: description,
                    })
                    .collect(),
            }],
        }
    }

    /// Ids referenced by the trail, in presentation order
    pub fn item_ids(&self) -> Vec<&str> {
        self.organized_trail
            .iter()
            .flat_map(|s| s.items.iter().map(|i| i.id.as_str()))
            .collect()
    }
}
