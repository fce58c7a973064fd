//! AI curation seam
//!
//! The filter and organize steps go through the `Curator` trait so the
//! pipeline can be exercised with scripted curators in tests. The production
//! implementation delegates to Gemini. Curation errors never abort a
//! pipeline run; callers apply lenient fallbacks instead.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{ContentItem, OrganizedTrail};

use super::gemini_client::{GeminiClient, GeminiError};

/// Curation errors
#[derive(Debug, Error)]
pub enum CuratorError {
    /// No AI backend configured
    #[error("AI curation is not configured")]
    NotConfigured,

    #[error(transparent)]
    Gemini(#[from] GeminiError),
}

/// Inputs shared by both curation steps
pub struct CurationRequest<'a> {
    pub topic: &'a str,
    pub answers: &'a [String],
    pub language: &'a str,
    /// Optional cultural-profile text injected into prompts
    pub cultural_context: Option<&'a str>,
}

/// Filter and organize steps of trail generation
#[async_trait]
pub trait Curator: Send + Sync {
    /// Ids of the items worth keeping, drawn from `items`
    async fn filter(
        &self,
        items: &[ContentItem],
        request: &CurationRequest<'_>,
    ) -> Result<Vec<String>, CuratorError>;

    /// Sectioned curriculum over the approved items
    async fn organize(
        &self,
        items: &[ContentItem],
        request: &CurationRequest<'_>,
    ) -> Result<OrganizedTrail, CuratorError>;
}

/// Gemini-backed curator
///
/// Built with `None` when no API key is configured; every call then fails
/// with `NotConfigured` and the pipeline falls back as if the model were
/// unreachable.
pub struct GeminiCurator {
    client: Option<Arc<GeminiClient>>,
}

impl GeminiCurator {
    pub fn new(client: Option<Arc<GeminiClient>>) -> Self {
        Self { client }
    }

    fn client(&self) -> Result<&GeminiClient, CuratorError> {
        self.client.as_deref().ok_or(CuratorError::NotConfigured)
    }
}

#[async_trait]
impl Curator for GeminiCurator {
    async fn filter(
        &self,
        items: &[ContentItem],
        request: &CurationRequest<'_>,
    ) -> Result<Vec<String>, CuratorError> {
        let decision = self
            .client()?
            .filter_content(items, request.topic, request.answers, request.cultural_context)
            .await?;
        Ok(decision.approved_content_ids)
    }

    async fn organize(
        &self,
        items: &[ContentItem],
        request: &CurationRequest<'_>,
    ) -> Result<OrganizedTrail, CuratorError> {
        Ok(self
            .client()?
            .organize_trail(
                items,
                request.topic,
                request.answers,
                request.language,
                request.cultural_context,
            )
            .await?)
    }
}
