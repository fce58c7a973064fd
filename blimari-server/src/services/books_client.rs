//! Google Books client
//!
//! The volumes endpoint works without an API key, so the books source is
//! always available. Average ratings arrive on the same 0-5 scale the
//! discovery ranking uses.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ContentItem, ContentSource, ContentType};

const BOOKS_BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";
const MAX_RESULTS: u32 = 10;

/// Books client errors
#[derive(Debug, Error)]
pub enum BooksError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Google Books volumes API client
pub struct BooksClient {
    http_client: reqwest::Client,
}

impl BooksClient {
    pub fn new() -> Result<Self, BooksError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BooksError::NetworkError(e.to_string()))?;

        Ok(Self { http_client })
    }

    /// Search books about a topic
    pub async fn search_books(&self, topic: &str) -> Result<Vec<ContentItem>, BooksError> {
        tracing::debug!(topic = %topic, "Searching Google Books");

        let response = self
            .http_client
            .get(BOOKS_BASE_URL)
            .query(&[
                ("q", topic),
                ("maxResults", &MAX_RESULTS.to_string()),
                ("printType", "books"),
                ("orderBy", "relevance"),
            ])
            .send()
            .await
            .map_err(|e| BooksError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BooksError::ApiError(status.as_u16(), error_text));
        }

        let search: VolumesResponse = response
            .json()
            .await
            .map_err(|e| BooksError::ParseError(e.to_string()))?;

        Ok(search.items.into_iter().map(volume_to_item).collect())
    }
}

fn volume_to_item(volume: Volume) -> ContentItem {
    let info = volume.volume_info;

    ContentItem {
        url: info
            .info_link
            .unwrap_or_else(|| format!("https://books.google.com/books?id={}", volume.id)),
        id: format!("book-{}", volume.id),
        title: info.title,
        description: info.description.unwrap_or_default(),
        source: ContentSource::Books,
        content_type: ContentType::Documentation,
        duration_minutes: None,
        author: info.authors.and_then(|a| a.into_iter().next()),
        rating: info.average_rating,
        thumbnail: info.image_links.and_then(|l| l.thumbnail),
        approved: false,
        completed: false,
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: String,
    description: Option<String>,
    authors: Option<Vec<String>>,
    average_rating: Option<f64>,
    info_link: Option<String>,
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}
