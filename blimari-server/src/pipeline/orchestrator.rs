//! Trail-generation pipeline orchestrator
//!
//! Runs the four steps in order: search, filter, organize, finalize. The
//! curation steps are lenient: a filter failure approves everything, an
//! organize failure produces a single passthrough section. Only a
//! persistence failure ends the session in the failed state. Session state
//! is saved after every transition so status polls always see current
//! progress, and every transition is mirrored onto the event bus.

use blimari_common::events::{EventBus, TrailEvent, TrailStep};
use blimari_common::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db;
use crate::models::{
    ContentItem, LearningPath, OrganizedTrail, PathStatus, SessionState, TrailSession,
};
use crate::services::{CurationRequest, Curator, DiscoveryService};

/// Section title used when the organize step falls back
const FALLBACK_SECTION_TITLE: &str = "Trilha Completa";

/// Runs trail-generation sessions end to end
pub struct TrailOrchestrator {
    db: SqlitePool,
    discovery: Arc<DiscoveryService>,
    curator: Arc<dyn Curator>,
    event_bus: EventBus,
}

impl TrailOrchestrator {
    pub fn new(
        db: SqlitePool,
        discovery: Arc<DiscoveryService>,
        curator: Arc<dyn Curator>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            db,
            discovery,
            curator,
            event_bus,
        }
    }

    /// Run one session from idle to a terminal state
    ///
    /// A session that already left the idle state is left untouched, so
    /// duplicate trigger calls run the pipeline at most once.
    pub async fn execute(&self, mut session: TrailSession) -> Result<()> {
        if !session.begin() {
            warn!(
                session_id = %session.session_id,
                state = ?session.state,
                "Session already started, ignoring duplicate trigger"
            );
            return Ok(());
        }

        info!(
            session_id = %session.session_id,
            topic = %session.topic,
            "Starting trail generation"
        );

        db::sessions::save_session(&self.db, &session).await?;
        self.event_bus.emit(TrailEvent::SessionStarted {
            session_id: session.session_id,
            topic: session.topic.clone(),
            timestamp: session.started_at,
        });

        let cultural_context = self.load_cultural_context(&session.user_id).await;

        // Step 1: search
        let items = self.run_search(&mut session).await?;

        // Step 2: filter
        let approved = self
            .run_filter(&mut session, items, cultural_context.as_deref())
            .await?;

        // Step 3: organize
        let (trail, content) = self
            .run_organize(&mut session, approved, cultural_context.as_deref())
            .await?;

        // Step 4: finalize
        self.run_finalize(&mut session, trail, content).await
    }

    async fn run_search(&self, session: &mut TrailSession) -> Result<Vec<ContentItem>> {
        session.start_step(TrailStep::Search, "Searching content sources");
        db::sessions::save_session(&self.db, session).await?;
        self.event_bus.emit(TrailEvent::StepStarted {
            session_id: session.session_id,
            step: TrailStep::Search,
        });

        let items = self
            .discovery
            .discover(&session.topic, &session.sources)
            .await;

        info!(
            session_id = %session.session_id,
            count = items.len(),
            "Discovery complete"
        );
        self.event_bus.emit(TrailEvent::ContentDiscovered {
            session_id: session.session_id,
            count: items.len(),
        });

        session.complete_step(TrailStep::Search);
        session.transition_to(SessionState::Filtering);
        db::sessions::save_session(&self.db, session).await?;
        self.event_bus.emit(TrailEvent::StepCompleted {
            session_id: session.session_id,
            step: TrailStep::Search,
            item_count: items.len(),
        });

        Ok(items)
    }

    async fn run_filter(
        &self,
        session: &mut TrailSession,
        items: Vec<ContentItem>,
        cultural_context: Option<&str>,
    ) -> Result<Vec<ContentItem>> {
        session.start_step(TrailStep::Filter, "Filtering content with AI");
        db::sessions::save_session(&self.db, session).await?;
        self.event_bus.emit(TrailEvent::StepStarted {
            session_id: session.session_id,
            step: TrailStep::Filter,
        });

        let request = CurationRequest {
            topic: &session.topic,
            answers: &session.answers,
            language: &session.language,
            cultural_context,
        };

        // Lenient fallback: a failed filter approves everything rather than
        // discarding the discovery results.
        let approved = match self.curator.filter(&items, &request).await {
            Ok(approved_ids) => {
                let id_set: std::collections::HashSet<&str> =
                    approved_ids.iter().map(String::as_str).collect();
                items
                    .into_iter()
                    .filter(|item| id_set.contains(item.id.as_str()))
                    .map(|mut item| {
                        item.approved = true;
                        item
                    })
                    .collect()
            }
            Err(e) => {
                warn!(
                    session_id = %session.session_id,
                    error = %e,
                    "Filter step failed, approving all discovered content"
                );
                items
                    .into_iter()
                    .map(|mut item| {
                        item.approved = true;
                        item
                    })
                    .collect::<Vec<_>>()
            }
        };

        session.complete_step(TrailStep::Filter);
        session.transition_to(SessionState::Organizing);
        db::sessions::save_session(&self.db, session).await?;
        self.event_bus.emit(TrailEvent::StepCompleted {
            session_id: session.session_id,
            step: TrailStep::Filter,
            item_count: approved.len(),
        });

        Ok(approved)
    }

    async fn run_organize(
        &self,
        session: &mut TrailSession,
        approved: Vec<ContentItem>,
        cultural_context: Option<&str>,
    ) -> Result<(Option<OrganizedTrail>, Vec<ContentItem>)> {
        session.start_step(TrailStep::Organize, "Organizing the learning trail");
        db::sessions::save_session(&self.db, session).await?;
        self.event_bus.emit(TrailEvent::StepStarted {
            session_id: session.session_id,
            step: TrailStep::Organize,
        });

        let request = CurationRequest {
            topic: &session.topic,
            answers: &session.answers,
            language: &session.language,
            cultural_context,
        };

        let trail = if approved.is_empty() {
            None
        } else {
            let organized = match self.curator.organize(&approved, &request).await {
                Ok(trail) => sanitize_trail(trail, &approved),
                Err(e) => {
                    warn!(
                        session_id = %session.session_id,
                        error = %e,
                        "Organize step failed, using single-section fallback"
                    );
                    None
                }
            };
            Some(organized.unwrap_or_else(|| passthrough_trail(&approved)))
        };

        // The trail order is authoritative: content rows follow it, and the
        // organize step's rewritten descriptions replace the originals.
        let content = match &trail {
            Some(trail) => reorder_content(trail, approved),
            None => approved,
        };

        session.complete_step(TrailStep::Organize);
        session.transition_to(SessionState::Finalizing);
        db::sessions::save_session(&self.db, session).await?;
        self.event_bus.emit(TrailEvent::StepCompleted {
            session_id: session.session_id,
            step: TrailStep::Organize,
            item_count: content.len(),
        });

        Ok((trail, content))
    }

    async fn run_finalize(
        &self,
        session: &mut TrailSession,
        trail: Option<OrganizedTrail>,
        content: Vec<ContentItem>,
    ) -> Result<()> {
        session.start_step(TrailStep::Finalize, "Saving the learning path");
        db::sessions::save_session(&self.db, session).await?;
        self.event_bus.emit(TrailEvent::StepStarted {
            session_id: session.session_id,
            step: TrailStep::Finalize,
        });

        if content.is_empty() {
            info!(
                session_id = %session.session_id,
                "No content to save, completing without a learning path"
            );
            session.complete_step(TrailStep::Finalize);
            session.current_operation = String::from("No content to save");
            return self.complete(session).await;
        }

        let now = Utc::now();
        let path = LearningPath {
            id: Uuid::new_v4(),
            user_id: session.user_id.clone(),
            title: format!("Trilha de {}", session.topic),
            topic: session.topic.clone(),
            difficulty: String::from("beginner"),
            description: format!(
                "Uma trilha de aprendizado personalizada sobre {}.",
                session.topic
            ),
            total_content: content.len() as i64,
            completed_content: 0,
            progress: 0,
            status: PathStatus::Active,
            organized_trail: trail,
            content,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db::paths::create_learning_path(&self.db, &path).await {
            error!(
                session_id = %session.session_id,
                error = %e,
                "Failed to persist learning path"
            );
            session.current_operation = format!("Failed to save learning path: {}", e);
            session.transition_to(SessionState::Failed);
            db::sessions::save_session(&self.db, session).await?;
            self.event_bus.emit(TrailEvent::SessionFailed {
                session_id: session.session_id,
                error: e.to_string(),
            });
            return Ok(());
        }

        session.learning_path_id = Some(path.id);
        session.complete_step(TrailStep::Finalize);
        session.current_operation = String::from("Learning path saved");
        self.complete(session).await
    }

    async fn complete(&self, session: &mut TrailSession) -> Result<()> {
        session.transition_to(SessionState::Completed);
        db::sessions::save_session(&self.db, session).await?;
        self.event_bus.emit(TrailEvent::StepCompleted {
            session_id: session.session_id,
            step: TrailStep::Finalize,
            item_count: session.learning_path_id.map(|_| 1).unwrap_or(0),
        });
        self.event_bus.emit(TrailEvent::SessionCompleted {
            session_id: session.session_id,
            learning_path_id: session.learning_path_id,
        });

        info!(
            session_id = %session.session_id,
            learning_path_id = ?session.learning_path_id,
            "Trail generation complete"
        );
        Ok(())
    }

    async fn load_cultural_context(&self, user_id: &str) -> Option<String> {
        match db::users::get_cultural_profile(&self.db, user_id).await {
            Ok(profile) => profile.and_then(|p| p.prompt_context()),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load cultural profile");
                None
            }
        }
    }
}

/// Drop trail references to unknown ids; None when nothing valid remains
fn sanitize_trail(mut trail: OrganizedTrail, approved: &[ContentItem]) -> Option<OrganizedTrail> {
    let known: std::collections::HashSet<&str> =
        approved.iter().map(|i| i.id.as_str()).collect();

    for section in &mut trail.organized_trail {
        section.items.retain(|item| known.contains(item.id.as_str()));
    }
    trail.organized_trail.retain(|s| !s.items.is_empty());

    if trail.item_count() == 0 {
        None
    } else {
        Some(trail)
    }
}

/// Single-section trail over the approved items in their current order
fn passthrough_trail(approved: &[ContentItem]) -> OrganizedTrail {
    OrganizedTrail::single_section(
        FALLBACK_SECTION_TITLE,
        approved
            .iter()
            .map(|item| (item.id.clone(), item.description.clone())),
    )
}

/// Content rows in trail order, with trail descriptions applied
///
/// Approved items the organize response omitted are kept: they follow the
/// trail-ordered rows in their pre-organize order, as unreferenced content.
fn reorder_content(trail: &OrganizedTrail, approved: Vec<ContentItem>) -> Vec<ContentItem> {
    let arrival_order: Vec<String> = approved.iter().map(|item| item.id.clone()).collect();
    let mut by_id: HashMap<String, ContentItem> = approved
        .into_iter()
        .map(|item| (item.id.clone(), item))
        .collect();

    let mut content: Vec<ContentItem> = trail
        .organized_trail
        .iter()
        .flat_map(|section| section.items.iter())
        .filter_map(|trail_item| {
            by_id.remove(&trail_item.id).map(|mut item| {
                if !trail_item.organized_description.is_empty() {
                    item.description = trail_item.organized_description.clone();
                }
                item
            })
        })
        .collect();

    if !by_id.is_empty() {
        warn!(
            omitted = by_id.len(),
            "Organize response omitted approved items, appending them"
        );
        for id in &arrival_order {
            if let Some(item) = by_id.remove(id) {
                content.push(item);
            }
        }
    }

    content
}
