//! Integration tests for the blimari-server API endpoints
//!
//! Requests go through the full router via `tower::ServiceExt::oneshot`
//! against an in-memory database. No Gemini key is configured, so the
//! AI-backed endpoints exercise their fallback paths.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

use blimari_common::events::EventBus;
use blimari_server::db;
use blimari_server::models::{ContentSource, TrailSession};
use blimari_server::services::{DiscoveryService, GeminiCurator};
use blimari_server::AppState;

/// Test app with an in-memory database and no external clients
async fn create_test_app() -> (axum::Router, sqlx::SqlitePool) {
    let pool = sqlx::SqlitePool::connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    db::init_tables(&pool).await.expect("schema");

    let state = AppState {
        db: pool.clone(),
        event_bus: EventBus::new(64),
        discovery: Arc::new(DiscoveryService::new(vec![])),
        curator: Arc::new(GeminiCurator::new(None)),
        gemini: None,
        qloo: None,
        startup_time: Utc::now(),
    };

    (blimari_server::build_router(state), pool)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

fn post_json(uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user_id) = user {
        builder = builder.header("x-user-id", user_id);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user_id) = user {
        builder = builder.header("x-user-id", user_id);
    }
    builder.body(Body::empty()).unwrap()
}

fn sample_content() -> Value {
    json!([
        {
            "id": "v1",
            "title": "Rust basics",
            "description": "Intro video",
            "url": "https://www.youtube.com/watch?v=v1",
            "source": "youtube",
            "type": "video",
            "durationMinutes": 30,
            "rating": 4.5
        },
        {
            "id": "gh-1",
            "title": "rustlings",
            "description": "Exercises",
            "url": "https://github.com/rust-lang/rustlings",
            "source": "github",
            "type": "repository"
        }
    ])
}

#[tokio::test]
async fn health_reports_connected_database() {
    let (app, _pool) = create_test_app().await;

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "blimari-server");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn auth_routes_reject_anonymous_callers() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/learning-paths", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn save_list_and_fetch_learning_path() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/learning-paths/save",
            Some("u1"),
            json!({"topic": "Rust", "content": sample_content()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Trilha de Rust");
    assert_eq!(body["data"]["difficulty"], "beginner");
    assert_eq!(body["data"]["totalContent"], 2);
    assert_eq!(body["data"]["progress"], 0);
    let path_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get("/api/learning-paths", Some("u1")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/learning-paths/{}", path_id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let content = body["data"]["content"].as_array().unwrap();
    assert_eq!(content.len(), 2);
    assert_eq!(content[0]["id"], "v1");
    assert_eq!(content[1]["id"], "gh-1");

    let response = app
        .oneshot(get(
            &format!("/api/learning-paths/{}/content/gh-1", path_id),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["source"], "github");
}

#[tokio::test]
async fn unknown_path_returns_not_found() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(get(
            "/api/learning-paths/00000000-0000-0000-0000-000000000000",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Malformed id is a 400, not a 404
    let response = app
        .oneshot(get("/api/learning-paths/not-a-uuid", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn progress_updates_recompute_the_path() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/learning-paths/save",
            Some("u1"),
            json!({"topic": "Rust", "content": sample_content()}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    let path_id = body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/learning-paths/progress",
            Some("u1"),
            json!({"learningPathId": path_id, "contentId": "v1", "isCompleted": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["completedContent"], 1);
    assert_eq!(body["data"]["progress"], 50);
    assert_eq!(body["data"]["status"], "active");

    // Next lesson skips the completed item
    let response = app
        .clone()
        .oneshot(get("/api/learning-paths/next-lesson", Some("u1")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["content"]["id"], "gh-1");

    // Completing the rest reaches 100% and flips the status
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/learning-paths/progress",
            Some("u1"),
            json!({"learningPathId": path_id, "contentId": "gh-1", "isCompleted": true}),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["progress"], 100);
    assert_eq!(body["data"]["status"], "completed");

    let response = app
        .oneshot(get("/api/learning-paths/next-lesson", Some("u1")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn progress_for_unknown_content_is_not_found() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/learning-paths/progress",
            Some("u1"),
            json!({
                "learningPathId": "00000000-0000-0000-0000-000000000000",
                "contentId": "ghost",
                "isCompleted": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn questions_require_a_configured_model() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/ai/questions",
            None,
            json!({"topic": "Rust"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn insights_degrade_to_a_fallback_message() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/ai/insights",
            None,
            json!({"topic": "Rust", "answers": ["beginner"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(body["data"]["insightText"].as_str().unwrap().contains("Rust"));
    assert_eq!(body["data"]["recommendedSources"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn filter_falls_back_to_approving_everything() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/content/filter",
            None,
            json!({"contentList": sample_content(), "topic": "Rust", "answers": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let approved = body["data"]["approvedContentIds"].as_array().unwrap();
    assert_eq!(approved.len(), 2);
}

#[tokio::test]
async fn organize_falls_back_to_a_single_section() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/content/organize",
            None,
            json!({"contentList": sample_content(), "topic": "Rust"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let sections = body["data"]["organizedTrail"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["sectionTitle"], "Trilha Completa");
    assert_eq!(sections[0]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn discover_with_no_configured_sources_is_empty() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .oneshot(post_json(
            "/api/content/discover",
            None,
            json!({"topic": "Rust", "sources": ["youtube", "github"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn user_sync_creates_the_local_row_once() {
    let (app, pool) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/user/sync", Some("u1"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], "u1");

    // Second sync is a no-op returning the same row
    let response = app
        .oneshot(post_json("/api/user/sync", Some("u1"), json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = db::users::get_user(&pool, "u1").await.unwrap();
    assert!(user.is_some());
}

#[tokio::test]
async fn generate_conflicts_while_a_session_is_running() {
    let (app, pool) = create_test_app().await;

    // Simulate a session already in flight for the user
    let mut running = TrailSession::new(
        "u1".to_string(),
        "Rust".to_string(),
        vec![ContentSource::Youtube],
        vec![],
        "pt-BR".to_string(),
    );
    assert!(running.begin());
    db::sessions::save_session(&pool, &running).await.unwrap();

    let response = app
        .oneshot(post_json(
            "/api/trails/generate",
            Some("u1"),
            json!({"topic": "Rust", "sources": ["youtube"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn generate_accepts_and_session_is_pollable() {
    let (app, _pool) = create_test_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/trails/generate",
            Some("u1"),
            json!({"topic": "Rust", "sources": []}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    let session_id = body["data"]["sessionId"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(get(&format!("/api/trails/sessions/{}", session_id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["topic"], "Rust");

    let response = app
        .oneshot(get(
            "/api/trails/sessions/00000000-0000-0000-0000-000000000000",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
