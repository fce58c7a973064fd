//! YouTube Data API client
//!
//! Two-step lookup: `search` for candidate videos, then `videos` for the
//! duration and statistics the search endpoint omits. Statistics feed a
//! 0-5 quality rating so discovery can rank videos against other sources.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ContentItem, ContentSource, ContentType};

const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const MAX_RESULTS: u32 = 10;

/// YouTube client errors
#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// YouTube Data API client
pub struct YouTubeClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Result<Self, YouTubeError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| YouTubeError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
        })
    }

    /// Search educational videos for a topic
    pub async fn search_videos(&self, topic: &str) -> Result<Vec<ContentItem>, YouTubeError> {
        let query = format!("{} tutorial", topic);

        tracing::debug!(query = %query, "Searching YouTube");

        let search: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", &query),
                    ("type", "video"),
                    ("maxResults", &MAX_RESULTS.to_string()),
                    ("relevanceLanguage", "pt"),
                    ("safeSearch", "strict"),
                ],
            )
            .await?;

        let video_ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();

        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        let details: VideosResponse = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,contentDetails,statistics"),
                    ("id", &video_ids.join(",")),
                ],
            )
            .await?;

        Ok(details.items.into_iter().map(video_to_item).collect())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let url = format!("{}/{}", YOUTUBE_BASE_URL, endpoint);

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| YouTubeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(YouTubeError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| YouTubeError::ParseError(e.to_string()))
    }
}

fn video_to_item(video: Video) -> ContentItem {
    let rating = quality_rating(
        video.statistics.view_count(),
        video.statistics.like_count(),
    );
    let duration_minutes = video
        .content_details
        .as_ref()
        .and_then(|d| parse_iso8601_minutes(&d.duration));

    ContentItem {
        url: format!("https://www.youtube.com/watch?v={}", video.id),
        id: video.id,
        title: video.snippet.title,
        description: video.snippet.description,
        source: ContentSource::Youtube,
        content_type: ContentType::Video,
        duration_minutes,
        author: Some(video.snippet.channel_title),
        rating: Some(rating),
        thumbnail: video.snippet.thumbnails.and_then(|t| {
            t.high.or(t.medium).or(t.default).map(|t| t.url)
        }),
        approved: false,
        completed: false,
    }
}

/// 0-5 rating from view and like counts
///
/// View count sets the base on a log scale (1M views saturates it); the
/// like-to-view ratio adds up to one point on top.
fn quality_rating(views: u64, likes: u64) -> f64 {
    let view_score = ((views as f64 + 1.0).log10() / 6.0).min(1.0) * 4.0;
    let like_ratio = if views > 0 {
        (likes as f64 / views as f64 / 0.04).min(1.0)
    } else {
        0.0
    };
    ((view_score + like_ratio) * 10.0).round() / 10.0
}

/// Parse an ISO 8601 duration like "PT1H23M45S" into whole minutes
fn parse_iso8601_minutes(duration: &str) -> Option<u32> {
    let rest = duration.strip_prefix("PT").or_else(|| {
        // Durations of a day or more are rare for tutorials; P1DT2H style
        duration.strip_prefix('P')
    })?;

    let mut minutes: u64 = 0;
    let mut number = String::new();
    for ch in rest.chars() {
        if ch.is_ascii_digit() {
            number.push(ch);
            continue;
        }
        if ch == 'T' && number.is_empty() {
            continue;
        }
        let value: u64 = number.parse().ok()?;
        number.clear();
        match ch {
            'D' => minutes += value * 24 * 60,
            'H' => minutes += value * 60,
            'M' => minutes += value,
            'S' => {
                if value >= 30 {
                    minutes += 1;
                }
            }
            _ => return None,
        }
    }

    Some(minutes.min(u32::MAX as u64) as u32)
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    id: String,
    snippet: VideoSnippet,
    content_details: Option<ContentDetails>,
    #[serde(default)]
    statistics: Statistics,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

// Statistics arrive as strings in the API payload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
    view_count: Option<String>,
    like_count: Option<String>,
}

impl Statistics {
    fn view_count(&self) -> u64 {
        self.view_count
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    fn like_count(&self) -> u64 {
        self.like_count
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso8601_durations() {
        assert_eq!(parse_iso8601_minutes("PT1H23M45S"), Some(84));
        assert_eq!(parse_iso8601_minutes("PT15M"), Some(15));
        assert_eq!(parse_iso8601_minutes("PT45S"), Some(1));
        assert_eq!(parse_iso8601_minutes("PT10S"), Some(0));
        assert_eq!(parse_iso8601_minutes("PT2H"), Some(120));
        assert_eq!(parse_iso8601_minutes("P1DT2H"), Some(26 * 60));
        assert_eq!(parse_iso8601_minutes("garbage"), None);
    }

    #[test]
    fn rating_stays_within_bounds() {
        assert_eq!(quality_rating(0, 0), 0.0);
        let popular = quality_rating(2_000_000, 100_000);
        assert!(popular > 4.0 && popular <= 5.0);
        let modest = quality_rating(5_000, 200);
        assert!(modest > 0.0 && modest < popular);
    }

    #[test]
    fn statistics_parse_string_counts() {
        let stats: Statistics =
            serde_json::from_str(r#"{"viewCount": "12345", "likeCount": "678"}"#).unwrap();
        assert_eq!(stats.view_count(), 12345);
        assert_eq!(stats.like_count(), 678);
    }
}
