//! Content item model
//!
//! A `ContentItem` is one discovered learning resource, normalized from
//! whichever external API produced it. Items exist transiently during
//! discovery and are persisted only when a learning path is finalized.

use serde::{Deserialize, Serialize};

/// External content provider tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    /// Video platform (YouTube Data API)
    Youtube,
    /// Code host (GitHub repository search)
    Github,
    /// Web articles (Google Custom Search)
    Web,
    /// Books and reference documentation (Google Books)
    Books,
}

impl ContentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Youtube => "youtube",
            ContentSource::Github => "github",
            ContentSource::Web => "web",
            ContentSource::Books => "books",
        }
    }
}

impl std::str::FromStr for ContentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(ContentSource::Youtube),
            "github" => Ok(ContentSource::Github),
            "web" => Ok(ContentSource::Web),
            "books" => Ok(ContentSource::Books),
            other => Err(format!("unknown content source: {}", other)),
        }
    }
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of learning resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Article,
    Repository,
    Documentation,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Article => "article",
            ContentType::Repository => "repository",
            ContentType::Documentation => "documentation",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(ContentType::Video),
            "article" => Ok(ContentType::Article),
            "repository" => Ok(ContentType::Repository),
            "documentation" => Ok(ContentType::Documentation),
            other => Err(format!("unknown content type: {}", other)),
        }
    }
}

/// One discovered or curated learning resource
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Opaque identifier: a video id, repository id, or URL
    pub id: String,
    pub title: String,
    /// Free text; rewritten by the organize step
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
    pub source: ContentSource,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Watch/read time in minutes, when the source exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// 0.0–5.0 quality rating derived from source statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Set by the filter step
    #[serde(default)]
    pub approved: bool,
    /// Set by end users once the item is persisted in a path
    #[serde(default)]
    pub completed: bool,
}

impl ContentItem {
    /// Rating used for ordering; missing ratings sort as 0.0
    pub fn sort_rating(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_round_trips_through_str() {
        for source in [
            ContentSource::Youtube,
            ContentSource::Github,
            ContentSource::Web,
            ContentSource::Books,
        ] {
            assert_eq!(source.as_str().parse::<ContentSource>().unwrap(), source);
        }
    }

    #[test]
    fn item_serializes_with_camel_case_keys() {
        let item = ContentItem {
            id: "yt-1".into(),
            title: "Rust basics".into(),
            description: String::new(),
            url: "https://youtube.com/watch?v=abc".into(),
            source: ContentSource::Youtube,
            content_type: ContentType::Video,
            duration_minutes: Some(45),
            author: Some("Tech Academy".into()),
            rating: Some(4.8),
            thumbnail: None,
            approved: false,
            completed: false,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["durationMinutes"], 45);
        assert_eq!(json["type"], "video");
        assert_eq!(json["source"], "youtube");
    }
}
