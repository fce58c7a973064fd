//! Multi-source content discovery
//!
//! Fans a topic query out to the requested source clients, one at a time in
//! request order. A failed source is logged and skipped; discovery succeeds
//! with whatever the remaining sources return. The merged list is ranked by
//! rating (stable, so same-rating items keep arrival order) and truncated
//! to the best candidates before curation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{ContentItem, ContentSource};

use super::books_client::BooksClient;
use super::github_client::GitHubClient;
use super::websearch_client::WebSearchClient;
use super::youtube_client::YouTubeClient;

/// Merged result cap handed to the curation steps
const MAX_DISCOVERED_ITEMS: usize = 10;

/// One external content provider
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn source(&self) -> ContentSource;

    async fn discover(&self, topic: &str) -> anyhow::Result<Vec<ContentItem>>;
}

#[async_trait]
impl SourceClient for YouTubeClient {
    fn source(&self) -> ContentSource {
        ContentSource::Youtube
    }

    async fn discover(&self, topic: &str) -> anyhow::Result<Vec<ContentItem>> {
        Ok(self.search_videos(topic).await?)
    }
}

#[async_trait]
impl SourceClient for GitHubClient {
    fn source(&self) -> ContentSource {
        ContentSource::Github
    }

    async fn discover(&self, topic: &str) -> anyhow::Result<Vec<ContentItem>> {
        Ok(self.search_repositories(topic).await?)
    }
}

#[async_trait]
impl SourceClient for WebSearchClient {
    fn source(&self) -> ContentSource {
        ContentSource::Web
    }

    async fn discover(&self, topic: &str) -> anyhow::Result<Vec<ContentItem>> {
        Ok(self.search_articles(topic).await?)
    }
}

#[async_trait]
impl SourceClient for BooksClient {
    fn source(&self) -> ContentSource {
        ContentSource::Books
    }

    async fn discover(&self, topic: &str) -> anyhow::Result<Vec<ContentItem>> {
        Ok(self.search_books(topic).await?)
    }
}

/// Discovery fan-out over the configured source clients
pub struct DiscoveryService {
    clients: HashMap<ContentSource, Arc<dyn SourceClient>>,
}

impl DiscoveryService {
    pub fn new(clients: Vec<Arc<dyn SourceClient>>) -> Self {
        let clients = clients
            .into_iter()
            .map(|client| (client.source(), client))
            .collect();
        Self { clients }
    }

    /// Sources with a configured client
    pub fn available_sources(&self) -> Vec<ContentSource> {
        self.clients.keys().copied().collect()
    }

    /// Query each requested source in order and merge the ranked results
    pub async fn discover(
        &self,
        topic: &str,
        sources: &[ContentSource],
    ) -> Vec<ContentItem> {
        let mut items = Vec::new();

        for source in sources {
            let Some(client) = self.clients.get(source) else {
                warn!(source = %source, "Source not configured, skipping");
                continue;
            };

            match client.discover(topic).await {
                Ok(found) => {
                    info!(source = %source, count = found.len(), "Source discovery complete");
                    items.extend(found);
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Source discovery failed, skipping");
                }
            }
        }

        rank_and_truncate(items)
    }
}

/// Stable rating sort, best first, capped at the discovery limit
fn rank_and_truncate(mut items: Vec<ContentItem>) -> Vec<ContentItem> {
    items.sort_by(|a, b| b.sort_rating().total_cmp(&a.sort_rating()));
    items.truncate(MAX_DISCOVERED_ITEMS);
    items
}
