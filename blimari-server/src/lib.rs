//! blimari-server library interface
//!
//! Exposes the application state, router, and internals for integration
//! testing.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

pub use crate::config::Config;
pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use blimari_common::events::EventBus;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::pipeline::TrailOrchestrator;
use crate::services::{
    BooksClient, Curator, DiscoveryService, GeminiClient, GeminiCurator, GitHubClient,
    QlooClient, SourceClient, WebSearchClient, YouTubeClient,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Content discovery over the configured sources
    pub discovery: Arc<DiscoveryService>,
    /// Filter/organize curation backend
    pub curator: Arc<dyn Curator>,
    /// Question/insight generation; None when no key is configured
    pub gemini: Option<Arc<GeminiClient>>,
    /// Cultural taste enrichment; None when no key is configured
    pub qloo: Option<Arc<QlooClient>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Build state with clients derived from the configuration
    ///
    /// Missing API keys disable the corresponding client; the books source
    /// needs no key and is always available.
    pub fn new(db: SqlitePool, config: &Config) -> blimari_common::Result<Self> {
        let map_err =
            |e: &dyn std::fmt::Display| blimari_common::Error::Config(e.to_string());

        let mut sources: Vec<Arc<dyn SourceClient>> = Vec::new();

        if let Some(key) = &config.youtube_api_key {
            sources.push(Arc::new(
                YouTubeClient::new(key.clone()).map_err(|e| map_err(&e))?,
            ));
        }
        // GitHub search works unauthenticated at a reduced rate limit
        sources.push(Arc::new(
            GitHubClient::new(config.github_token.clone()).map_err(|e| map_err(&e))?,
        ));
        if let (Some(key), Some(cx)) = (&config.google_search_api_key, &config.google_search_cx)
        {
            sources.push(Arc::new(
                WebSearchClient::new(key.clone(), cx.clone()).map_err(|e| map_err(&e))?,
            ));
        }
        sources.push(Arc::new(BooksClient::new().map_err(|e| map_err(&e))?));

        let gemini = config
            .gemini_api_key
            .as_ref()
            .map(|key| GeminiClient::new(key.clone()).map(Arc::new))
            .transpose()
            .map_err(|e| map_err(&e))?;

        let qloo = config
            .qloo_api_key
            .as_ref()
            .map(|key| {
                QlooClient::new(key.clone(), config.qloo_base_url.clone()).map(Arc::new)
            })
            .transpose()
            .map_err(|e| map_err(&e))?;

        Ok(Self {
            db,
            event_bus: EventBus::new(256),
            discovery: Arc::new(DiscoveryService::new(sources)),
            curator: Arc::new(GeminiCurator::new(gemini.clone())),
            gemini,
            qloo,
            startup_time: Utc::now(),
        })
    }

    /// Orchestrator wired to this state's services
    pub fn orchestrator(&self) -> TrailOrchestrator {
        TrailOrchestrator::new(
            self.db.clone(),
            Arc::clone(&self.discovery),
            Arc::clone(&self.curator),
            self.event_bus.clone(),
        )
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;
    use tower_http::cors::CorsLayer;

    Router::new()
        .merge(api::ai_routes())
        .merge(api::content_routes())
        .merge(api::path_routes())
        .merge(api::user_routes())
        .merge(api::trail_routes())
        .route("/health", get(api::health::health_check))
        .with_state(state)
        // Browser front end runs on a different origin in development
        .layer(CorsLayer::permissive())
}
