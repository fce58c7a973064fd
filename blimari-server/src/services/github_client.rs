//! GitHub repository search client
//!
//! Searches repositories by topic, ranked by stars. Works unauthenticated
//! at a reduced rate limit; a token raises the limit. GitHub rejects
//! requests without a User-Agent header.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::models::{ContentItem, ContentSource, ContentType};

const GITHUB_BASE_URL: &str = "https://api.github.com";
const USER_AGENT: &str = "blimari/0.1";
const MAX_RESULTS: u32 = 10;
const README_EXCERPT_CHARS: usize = 500;

/// GitHub client errors
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// GitHub search API client
pub struct GitHubClient {
    http_client: reqwest::Client,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self, GitHubError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GitHubError::NetworkError(e.to_string()))?;

        Ok(Self { http_client, token })
    }

    /// Search learning-oriented repositories for a topic, best-starred first
    pub async fn search_repositories(&self, topic: &str) -> Result<Vec<ContentItem>, GitHubError> {
        let query = format!("{} tutorial OR awesome OR learning", topic);

        tracing::debug!(query = %query, "Searching GitHub repositories");

        let url = format!("{}/search/repositories", GITHUB_BASE_URL);
        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .query(&[
                ("q", query.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", &MAX_RESULTS.to_string()),
            ]);

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GitHubError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GitHubError::ApiError(status.as_u16(), error_text));
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| GitHubError::ParseError(e.to_string()))?;

        let mut items = Vec::with_capacity(search.items.len());
        for repo in search.items {
            let full_name = repo.full_name.clone();
            let mut item = repo_to_item(repo);
            // Repos without a description get the README opening instead
            if item.description.is_empty() {
                if let Some(readme) = self.fetch_readme(&full_name).await {
                    item.description = readme;
                }
            }
            items.push(item);
        }
        Ok(items)
    }

    /// First part of the repository README as plain text; None on any failure
    async fn fetch_readme(&self, full_name: &str) -> Option<String> {
        let url = format!("{}/repos/{}/readme", GITHUB_BASE_URL, full_name);
        let mut request = self
            .http_client
            .get(&url)
            .header("Accept", "application/vnd.github.raw+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let text = response.text().await.ok()?;
        let trimmed: String = text.chars().take(README_EXCERPT_CHARS).collect();
        Some(trimmed.trim().to_string())
    }
}

fn repo_to_item(repo: Repository) -> ContentItem {
    let rating = star_rating(repo.stargazers_count);

    ContentItem {
        id: format!("gh-{}", repo.id),
        title: repo.full_name,
        description: repo.description.unwrap_or_default(),
        url: repo.html_url,
        source: ContentSource::Github,
        content_type: ContentType::Repository,
        duration_minutes: None,
        author: repo.owner.map(|o| o.login),
        rating: Some(rating),
        thumbnail: None,
        approved: false,
        completed: false,
    }
}

/// 0-5 rating on a log star scale; 100k stars saturates it
fn star_rating(stars: u64) -> f64 {
    let score = ((stars as f64 + 1.0).log10() / 5.0).min(1.0) * 5.0;
    (score * 10.0).round() / 10.0
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    id: u64,
    full_name: String,
    html_url: String,
    description: Option<String>,
    #[serde(default)]
    stargazers_count: u64,
    owner: Option<Owner>,
}

#[derive(Debug, Deserialize)]
struct Owner {
    login: String,
}
