//! Web article search client
//!
//! Google Custom Search wrapper. Each result page is fetched best-effort
//! and stripped of markup so the reading time estimate (200 words/minute,
//! floored at 3 minutes) reflects the full article; when the fetch fails
//! the snippet word count stands in.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ContentItem, ContentSource, ContentType};

const SEARCH_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const MAX_RESULTS: u32 = 10;
const WORDS_PER_MINUTE: usize = 200;

/// Web search client errors
#[derive(Debug, Error)]
pub enum WebSearchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Google Custom Search client
pub struct WebSearchClient {
    http_client: reqwest::Client,
    api_key: String,
    cx: String,
}

impl WebSearchClient {
    pub fn new(api_key: String, cx: String) -> Result<Self, WebSearchError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| WebSearchError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            cx,
        })
    }

    /// Search articles and guides for a topic
    pub async fn search_articles(&self, topic: &str) -> Result<Vec<ContentItem>, WebSearchError> {
        let query = format!("{} guide tutorial article", topic);

        tracing::debug!(query = %query, "Searching the web");

        let response = self
            .http_client
            .get(SEARCH_BASE_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cx.as_str()),
                ("q", query.as_str()),
                ("num", &MAX_RESULTS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| WebSearchError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(WebSearchError::ApiError(status.as_u16(), error_text));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| WebSearchError::ParseError(e.to_string()))?;

        let mut items = Vec::with_capacity(search.items.len());
        for result in search.items {
            let mut item = result_to_item(result);
            // Refine the reading time from the full article when reachable
            if let Some(text) = self.fetch_page_text(&item.url).await {
                item.duration_minutes = Some(estimate_reading_minutes(&text));
            }
            items.push(item);
        }
        Ok(items)
    }

    /// Fetch a page and strip it to plain text; None on any failure
    async fn fetch_page_text(&self, url: &str) -> Option<String> {
        let response = self.http_client.get(url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let html = response.text().await.ok()?;
        Some(strip_html_tags(&html))
    }
}

fn result_to_item(result: SearchResult) -> ContentItem {
    let snippet = result.snippet.unwrap_or_default();
    let reading_minutes = estimate_reading_minutes(&snippet);

    ContentItem {
        id: result.link.clone(),
        title: strip_html_tags(&result.title),
        description: strip_html_tags(&snippet),
        author: Some(result.display_link.unwrap_or_else(|| {
            domain_of(&result.link).unwrap_or_default()
        })),
        url: result.link,
        source: ContentSource::Web,
        content_type: ContentType::Article,
        duration_minutes: Some(reading_minutes),
        rating: None,
        thumbnail: None,
        approved: false,
        completed: false,
    }
}

/// Word count at 200 wpm, floored at 3 minutes for an article
fn estimate_reading_minutes(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    (words.div_ceil(WORDS_PER_MINUTE)).max(3) as u32
}

/// Remove markup tags; search titles sometimes carry `<b>` highlighting
fn strip_html_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

fn domain_of(url: &str) -> Option<String> {
    let rest = url.strip_prefix("https://").or_else(|| url.strip_prefix("http://"))?;
    Some(rest.split('/').next()?.to_string())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    title: String,
    link: String,
    snippet: Option<String>,
    display_link: Option<String>,
}
