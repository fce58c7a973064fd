//! End-to-end pipeline tests with scripted discovery and curation
//!
//! Exercises the trail-generation orchestrator against an in-memory
//! database, with the network-facing seams replaced by scripted
//! implementations.

use async_trait::async_trait;
use blimari_common::events::EventBus;
use std::sync::Arc;

use blimari_server::db;
use blimari_server::models::{
    ContentItem, ContentSource, ContentType, OrganizedTrail, SessionState, TrailSession,
};
use blimari_server::pipeline::TrailOrchestrator;
use blimari_server::services::{
    CurationRequest, Curator, CuratorError, DiscoveryService, SourceClient,
};

fn video(id: &str, rating: f64) -> ContentItem {
    ContentItem {
        id: id.to_string(),
        title: format!("Video {}", id),
        description: format!("About {}", id),
        url: format!("https://www.youtube.com/watch?v={}", id),
        source: ContentSource::Youtube,
        content_type: ContentType::Video,
        duration_minutes: Some(30),
        author: Some("Channel".to_string()),
        rating: Some(rating),
        thumbnail: None,
        approved: false,
        completed: false,
    }
}

struct FixedSource {
    source: ContentSource,
    items: Vec<ContentItem>,
}

#[async_trait]
impl SourceClient for FixedSource {
    fn source(&self) -> ContentSource {
        self.source
    }

    async fn discover(&self, _topic: &str) -> anyhow::Result<Vec<ContentItem>> {
        Ok(self.items.clone())
    }
}

/// Curator whose filter/organize behavior is scripted per test
struct ScriptedCurator {
    filter_fails: bool,
    organize_fails: bool,
    approve_ids: Option<Vec<String>>,
    /// Ids the organize response references; None references everything
    organize_ids: Option<Vec<String>>,
}

impl ScriptedCurator {
    fn approving_all() -> Self {
        Self {
            filter_fails: false,
            organize_fails: false,
            approve_ids: None,
            organize_ids: None,
        }
    }

    fn failing() -> Self {
        Self {
            filter_fails: true,
            organize_fails: true,
            approve_ids: None,
            organize_ids: None,
        }
    }
}

#[async_trait]
impl Curator for ScriptedCurator {
    async fn filter(
        &self,
        items: &[ContentItem],
        _request: &CurationRequest<'_>,
    ) -> Result<Vec<String>, CuratorError> {
        if self.filter_fails {
            return Err(CuratorError::NotConfigured);
        }
        Ok(self
            .approve_ids
            .clone()
            .unwrap_or_else(|| items.iter().map(|i| i.id.clone()).collect()))
    }

    async fn organize(
        &self,
        items: &[ContentItem],
        _request: &CurationRequest<'_>,
    ) -> Result<OrganizedTrail, CuratorError> {
        if self.organize_fails {
            return Err(CuratorError::NotConfigured);
        }
        let referenced: Vec<_> = match &self.organize_ids {
            Some(ids) => items.iter().filter(|i| ids.contains(&i.id)).collect(),
            None => items.iter().collect(),
        };
        Ok(OrganizedTrail::single_section(
            "Fundamentos",
            referenced
                .into_iter()
                .map(|i| (i.id.clone(), format!("Curated: {}", i.title))),
        ))
    }
}

async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    db::init_tables(&pool).await.expect("schema");
    pool
}

async fn seed_user(pool: &sqlx::SqlitePool, user_id: &str) {
    db::users::create_user(pool, user_id, None, None)
        .await
        .expect("seed user");
}

fn orchestrator(
    pool: &sqlx::SqlitePool,
    sources: Vec<Arc<dyn SourceClient>>,
    curator: ScriptedCurator,
) -> (TrailOrchestrator, EventBus) {
    let bus = EventBus::new(64);
    let orch = TrailOrchestrator::new(
        pool.clone(),
        Arc::new(DiscoveryService::new(sources)),
        Arc::new(curator),
        bus.clone(),
    );
    (orch, bus)
}

fn session(user_id: &str, sources: Vec<ContentSource>) -> TrailSession {
    TrailSession::new(
        user_id.to_string(),
        "Rust".to_string(),
        sources,
        vec!["beginner".to_string()],
        "pt-BR".to_string(),
    )
}

#[tokio::test]
async fn single_video_trail_is_generated_and_saved() {
    let pool = test_pool().await;
    seed_user(&pool, "u1").await;

    let (orch, _bus) = orchestrator(
        &pool,
        vec![Arc::new(FixedSource {
            source: ContentSource::Youtube,
            items: vec![video("v1", 4.5)],
        })],
        ScriptedCurator::approving_all(),
    );

    let s = session("u1", vec![ContentSource::Youtube]);
    let session_id = s.session_id;
    orch.execute(s).await.expect("pipeline run");

    let saved = db::sessions::load_session(&pool, session_id)
        .await
        .unwrap()
        .expect("session persisted");
    assert_eq!(saved.state, SessionState::Completed);
    assert_eq!(saved.percentage, 100.0);
    assert!(saved.all_steps_completed());
    assert!(saved.ended_at.is_some());

    let path_id = saved.learning_path_id.expect("path saved");
    let path = db::paths::get_path(&pool, path_id)
        .await
        .unwrap()
        .expect("path row");
    assert_eq!(path.topic, "Rust");
    assert_eq!(path.title, "Trilha de Rust");
    assert_eq!(path.difficulty, "beginner");
    assert_eq!(path.total_content, 1);
    assert_eq!(path.completed_content, 0);
    assert_eq!(path.progress, 0);
    assert_eq!(path.content.len(), 1);
    assert_eq!(path.content[0].id, "v1");
    // Organize step rewrote the description
    assert_eq!(path.content[0].description, "Curated: Video v1");
}

#[tokio::test]
async fn completing_the_only_item_reaches_full_progress() {
    let pool = test_pool().await;
    seed_user(&pool, "u1").await;

    let (orch, _bus) = orchestrator(
        &pool,
        vec![Arc::new(FixedSource {
            source: ContentSource::Youtube,
            items: vec![video("v1", 4.0)],
        })],
        ScriptedCurator::approving_all(),
    );

    let s = session("u1", vec![ContentSource::Youtube]);
    let session_id = s.session_id;
    orch.execute(s).await.unwrap();

    let saved = db::sessions::load_session(&pool, session_id)
        .await
        .unwrap()
        .unwrap();
    let path_id = saved.learning_path_id.unwrap();

    db::paths::set_content_completion(&pool, path_id, "v1", true)
        .await
        .unwrap();
    let progress = db::paths::recompute_progress(&pool, path_id).await.unwrap();
    assert_eq!(progress, 100);

    let path = db::paths::get_path(&pool, path_id).await.unwrap().unwrap();
    assert_eq!(path.progress, 100);
    assert_eq!(path.completed_content, 1);
    assert_eq!(path.status.as_str(), "completed");

    // Idempotent: recomputing without changes gives the same answer
    let again = db::paths::recompute_progress(&pool, path_id).await.unwrap();
    assert_eq!(again, 100);
}

#[tokio::test]
async fn empty_sources_complete_without_a_path() {
    let pool = test_pool().await;
    seed_user(&pool, "u1").await;

    let (orch, _bus) = orchestrator(&pool, vec![], ScriptedCurator::approving_all());

    let s = session("u1", vec![]);
    let session_id = s.session_id;
    orch.execute(s).await.unwrap();

    let saved = db::sessions::load_session(&pool, session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.state, SessionState::Completed);
    assert!(saved.learning_path_id.is_none());
    assert_eq!(saved.current_operation, "No content to save");
    assert!(saved.all_steps_completed());

    let paths = db::paths::get_paths_by_user(&pool, "u1").await.unwrap();
    assert!(paths.is_empty());
}

#[tokio::test]
async fn curation_failures_drop_nothing() {
    let pool = test_pool().await;
    seed_user(&pool, "u1").await;

    let discovered = vec![video("v1", 4.0), video("v2", 3.0), video("v3", 2.0)];
    let (orch, _bus) = orchestrator(
        &pool,
        vec![Arc::new(FixedSource {
            source: ContentSource::Youtube,
            items: discovered.clone(),
        })],
        ScriptedCurator::failing(),
    );

    let s = session("u1", vec![ContentSource::Youtube]);
    let session_id = s.session_id;
    orch.execute(s).await.unwrap();

    let saved = db::sessions::load_session(&pool, session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.state, SessionState::Completed);

    let path = db::paths::get_path(&pool, saved.learning_path_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    // Filter fallback approved everything, organize fallback kept the order
    assert_eq!(path.content.len(), 3);
    let ids: Vec<_> = path.content.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v2", "v3"]);

    let trail = path.organized_trail.expect("fallback trail");
    assert_eq!(trail.organized_trail.len(), 1);
    assert_eq!(trail.organized_trail[0].section_title, "Trilha Completa");
    assert_eq!(trail.item_count(), 3);
}

#[tokio::test]
async fn filter_decision_prunes_unapproved_items() {
    let pool = test_pool().await;
    seed_user(&pool, "u1").await;

    let (orch, _bus) = orchestrator(
        &pool,
        vec![Arc::new(FixedSource {
            source: ContentSource::Youtube,
            items: vec![video("v1", 4.0), video("v2", 3.0)],
        })],
        ScriptedCurator {
            filter_fails: false,
            organize_fails: false,
            approve_ids: Some(vec!["v2".to_string()]),
            organize_ids: None,
        },
    );

    let s = session("u1", vec![ContentSource::Youtube]);
    let session_id = s.session_id;
    orch.execute(s).await.unwrap();

    let saved = db::sessions::load_session(&pool, session_id)
        .await
        .unwrap()
        .unwrap();
    let path = db::paths::get_path(&pool, saved.learning_path_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(path.content.len(), 1);
    assert_eq!(path.content[0].id, "v2");
}

#[tokio::test]
async fn started_session_is_not_rerun() {
    let pool = test_pool().await;
    seed_user(&pool, "u1").await;

    let (orch, _bus) = orchestrator(
        &pool,
        vec![Arc::new(FixedSource {
            source: ContentSource::Youtube,
            items: vec![video("v1", 4.0)],
        })],
        ScriptedCurator::approving_all(),
    );

    let mut s = session("u1", vec![ContentSource::Youtube]);
    assert!(s.begin());

    // Already past idle: execute must be a no-op
    orch.execute(s).await.unwrap();
    let paths = db::paths::get_paths_by_user(&pool, "u1").await.unwrap();
    assert!(paths.is_empty());
}

#[tokio::test]
async fn same_item_is_saved_into_paths_of_different_users() {
    let pool = test_pool().await;
    seed_user(&pool, "u1").await;
    seed_user(&pool, "u2").await;

    for user_id in ["u1", "u2"] {
        // Both users discover the exact same external item
        let (orch, _bus) = orchestrator(
            &pool,
            vec![Arc::new(FixedSource {
                source: ContentSource::Youtube,
                items: vec![video("v1", 4.5)],
            })],
            ScriptedCurator::approving_all(),
        );
        let s = session(user_id, vec![ContentSource::Youtube]);
        let session_id = s.session_id;
        orch.execute(s).await.unwrap();

        let saved = db::sessions::load_session(&pool, session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.state, SessionState::Completed, "user {}", user_id);
        assert!(saved.learning_path_id.is_some(), "user {}", user_id);
    }

    // Completion is per path: marking u1's copy leaves u2's untouched
    let u1_path = db::paths::get_paths_by_user(&pool, "u1").await.unwrap()[0].id;
    let u2_path = db::paths::get_paths_by_user(&pool, "u2").await.unwrap()[0].id;
    db::paths::set_content_completion(&pool, u1_path, "v1", true)
        .await
        .unwrap();

    assert_eq!(db::paths::recompute_progress(&pool, u1_path).await.unwrap(), 100);
    assert_eq!(db::paths::recompute_progress(&pool, u2_path).await.unwrap(), 0);

    let u2_item = db::paths::get_content_item(&pool, u2_path, "v1")
        .await
        .unwrap()
        .unwrap();
    assert!(!u2_item.completed);
}

#[tokio::test]
async fn organize_omissions_do_not_lose_approved_content() {
    let pool = test_pool().await;
    seed_user(&pool, "u1").await;

    let (orch, _bus) = orchestrator(
        &pool,
        vec![Arc::new(FixedSource {
            source: ContentSource::Youtube,
            items: vec![video("v1", 4.0), video("v2", 3.0)],
        })],
        // Everything approved, but the organize response references only v1
        ScriptedCurator {
            filter_fails: false,
            organize_fails: false,
            approve_ids: None,
            organize_ids: Some(vec!["v1".to_string()]),
        },
    );

    let s = session("u1", vec![ContentSource::Youtube]);
    let session_id = s.session_id;
    orch.execute(s).await.unwrap();

    let saved = db::sessions::load_session(&pool, session_id)
        .await
        .unwrap()
        .unwrap();
    let path = db::paths::get_path(&pool, saved.learning_path_id.unwrap())
        .await
        .unwrap()
        .unwrap();

    // All approved content persists; the trail references a subset
    assert_eq!(path.content.len(), 2);
    let ids: Vec<_> = path.content.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["v1", "v2"]);

    let trail = path.organized_trail.unwrap();
    assert_eq!(trail.item_ids(), vec!["v1"]);
}

#[tokio::test]
async fn interrupted_sessions_poll_as_failed_after_cleanup() {
    let pool = test_pool().await;

    let mut running = session("u1", vec![ContentSource::Youtube]);
    assert!(running.begin());
    db::sessions::save_session(&pool, &running).await.unwrap();

    let cleaned = db::sessions::cleanup_stale_sessions(&pool).await.unwrap();
    assert_eq!(cleaned, 1);

    // A status poll reads the payload, which must now be terminal too
    let loaded = db::sessions::load_session(&pool, running.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.state, SessionState::Failed);
    assert!(loaded.ended_at.is_some());
    assert_eq!(
        loaded.current_operation,
        "Trail generation interrupted by server restart"
    );

    // The user is free to start a new session
    assert!(!db::sessions::has_running_session(&pool, "u1").await.unwrap());

    // Re-running cleanup finds nothing left to fail
    assert_eq!(db::sessions::cleanup_stale_sessions(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_source_still_yields_a_trail_from_the_others() {
    struct BrokenSource;

    #[async_trait]
    impl SourceClient for BrokenSource {
        fn source(&self) -> ContentSource {
            ContentSource::Github
        }

        async fn discover(&self, _topic: &str) -> anyhow::Result<Vec<ContentItem>> {
            anyhow::bail!("rate limited")
        }
    }

    let pool = test_pool().await;
    seed_user(&pool, "u1").await;

    let (orch, _bus) = orchestrator(
        &pool,
        vec![
            Arc::new(BrokenSource),
            Arc::new(FixedSource {
                source: ContentSource::Youtube,
                items: vec![video("v1", 4.0)],
            }),
        ],
        ScriptedCurator::approving_all(),
    );

    let s = session("u1", vec![ContentSource::Github, ContentSource::Youtube]);
    let session_id = s.session_id;
    orch.execute(s).await.unwrap();

    let saved = db::sessions::load_session(&pool, session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.state, SessionState::Completed);
    let path = db::paths::get_path(&pool, saved.learning_path_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(path.content.len(), 1);
}
