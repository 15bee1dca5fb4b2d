//! Integration tests for the vidflow-server HTTP API
//!
//! Each test builds the router over a fresh SQLite database and drives it
//! with `oneshot`. Sessions are created directly in the database and sent
//! as the `vidflow_session` cookie.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use vidflow_common::db::{init::init_database, projects, sessions, titulin, users, videos};
use vidflow_common::models::User;
use vidflow_common::titulin::Classification;
use vidflow_common::workflow::{Role, VideoStatus};
use vidflow_server::api::auth::{hash_password, SESSION_COOKIE};
use vidflow_server::services::{EmbeddingProvider, TitleClassifier};
use vidflow_server::{build_router, AppState};

// =============================================================================
// Helpers
// =============================================================================

struct TestApp {
    _dir: TempDir,
    pool: SqlitePool,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_database(&dir.path().join("vidflow.db")).await.unwrap();
        let state = AppState::new(pool.clone());
        Self { _dir: dir, pool, state }
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    async fn user(&self, username: &str, role: Role) -> User {
        self.user_with_limits(username, role, None).await
    }

    async fn user_with_limits(&self, username: &str, role: Role, max_assigned: Option<i64>) -> User {
        users::create_user(
            &self.pool,
            &users::NewUser {
                username: username.to_string(),
                password_hash: hash_password("secreto123").unwrap(),
                full_name: None,
                email: None,
                role,
                max_assigned_videos: max_assigned,
                max_monthly_videos: None,
            },
        )
        .await
        .unwrap()
    }

    async fn session(&self, user: &User) -> String {
        sessions::create_session(&self.pool, user.id, chrono::Duration::hours(1))
            .await
            .unwrap()
    }

    async fn project(&self) -> i64 {
        projects::create_project(
            &self.pool,
            &projects::ProjectInput {
                name: "Tutoriales".into(),
                prefix: Some("TUT".into()),
                description: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn video(&self, project_id: i64, title: &str) -> i64 {
        videos::create_video(
            &self.pool,
            project_id,
            &videos::NewVideo {
                title: title.to_string(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap()
        .id
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }
}

/// Request with an optional session token and JSON body
fn test_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

// =============================================================================
// Health and authentication
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = TestApp::new().await;

    let (status, body) = app.send(test_request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "vidflow-server");
}

#[tokio::test]
async fn test_protected_route_requires_session() {
    let app = TestApp::new().await;

    let (status, body) = app.send(test_request("GET", "/api/videos", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .send(test_request("GET", "/api/videos", Some("bogus-token"), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new().await;
    app.user("ana", Role::Optimizer).await;

    let response = app
        .router()
        .oneshot(test_request(
            "POST",
            "/api/login",
            None,
            Some(json!({"username": "ana", "password": "secreto123"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(cookie.starts_with(SESSION_COOKIE));
    assert!(cookie.contains("HttpOnly"));

    let token = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
        .unwrap();
    let (status, body) = app.send(test_request("GET", "/api/user", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "ana");
    assert_eq!(body["data"]["role"], "optimizer");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = TestApp::new().await;
    app.user("ana", Role::Optimizer).await;

    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/login",
            None,
            Some(json!({"username": "ana", "password": "incorrecta"})),
        ))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

// =============================================================================
// Workflow
// =============================================================================

#[tokio::test]
async fn test_invalid_transition_is_rejected_with_allowed_list() {
    let app = TestApp::new().await;
    let optimizer = app.user("opt", Role::Optimizer).await;
    let token = app.session(&optimizer).await;
    let project = app.project().await;
    let video = app.video(project, "Cómo usar Excel").await;

    let (status, body) = app
        .send(test_request(
            "PATCH",
            &format!("/api/projects/{}/videos/{}", project, video),
            Some(&token),
            Some(json!({"status": "completed"})),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["details"]["from"], "pending");
    assert_eq!(body["details"]["to"], "completed");
    assert_eq!(body["details"]["allowed"], json!(["in_progress"]));

    let stored = videos::get_video(&app.pool, video).await.unwrap().unwrap();
    assert_eq!(stored.status, VideoStatus::Pending);
}

#[tokio::test]
async fn test_optimizer_claims_pending_video() {
    let app = TestApp::new().await;
    let optimizer = app.user("opt", Role::Optimizer).await;
    let token = app.session(&optimizer).await;
    let project = app.project().await;
    let video = app.video(project, "Guía de Python").await;

    let (status, body) = app
        .send(test_request(
            "POST",
            &format!("/api/projects/{}/videos/{}/claim", project, video),
            Some(&token),
            None,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in_progress");
    assert_eq!(body["data"]["currentReviewerId"], optimizer.id);
    assert_eq!(body["data"]["allowedTransitions"], json!(["optimize_review"]));
    assert_eq!(body["data"]["revertTo"], "pending");
    assert_eq!(body["data"]["canUnassign"], false);
}

async fn move_to_upload_review(app: &TestApp, admin_token: &str, project: i64, video: i64) {
    let (status, _) = app
        .send(test_request(
            "PATCH",
            &format!("/api/projects/{}/videos/{}", project, video),
            Some(admin_token),
            Some(json!({"status": "upload_review"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_second_youtuber_claim_conflicts() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let first = app.user("yt1", Role::Youtuber).await;
    let second = app.user("yt2", Role::Youtuber).await;
    let admin_token = app.session(&admin).await;
    let project = app.project().await;
    let video = app.video(project, "Trucos de Word").await;
    move_to_upload_review(&app, &admin_token, project, video).await;

    let claim = format!("/api/projects/{}/videos/{}/claim", project, video);
    let first_token = app.session(&first).await;
    let (status, body) = app.send(test_request("POST", &claim, Some(&first_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["effectiveStatus"], "asignado");

    // Claiming again is a no-op for the holder
    let (status, _) = app.send(test_request("POST", &claim, Some(&first_token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let second_token = app.session(&second).await;
    let (status, body) = app.send(test_request("POST", &claim, Some(&second_token), None)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_youtuber_claim_respects_assigned_limit() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let youtuber = app.user_with_limits("yt", Role::Youtuber, Some(1)).await;
    let admin_token = app.session(&admin).await;
    let token = app.session(&youtuber).await;
    let project = app.project().await;

    let first = app.video(project, "Video uno").await;
    let second = app.video(project, "Video dos").await;
    move_to_upload_review(&app, &admin_token, project, first).await;
    move_to_upload_review(&app, &admin_token, project, second).await;

    let (status, _) = app
        .send(test_request(
            "POST",
            &format!("/api/projects/{}/videos/{}/claim", project, first),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .send(test_request("GET", "/api/youtuber/video-limits", Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currentAssignedCount"], 1);
    assert_eq!(body["data"]["maxAssignedAllowed"], 1);
    assert_eq!(body["data"]["canTakeMore"], false);

    let (status, _) = app
        .send(test_request(
            "POST",
            &format!("/api/projects/{}/videos/{}/claim", project, second),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_workflow_metadata_patch_is_admin_only() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let optimizer = app.user("opt", Role::Optimizer).await;
    let project = app.project().await;
    let video = app.video(project, "Atajos de teclado").await;
    let uri = format!("/api/projects/{}/videos/{}", project, video);

    let token = app.session(&optimizer).await;
    for key in ["customStatus", "secondaryStatus", "optimization", "corrections"] {
        let mut metadata = serde_json::Map::new();
        metadata.insert(key.to_string(), json!("completed"));
        let (status, body) = app
            .send(test_request("PATCH", &uri, Some(&token), Some(json!({"metadata": metadata}))))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", key);
        assert_eq!(body["success"], false);
    }
    let stored = videos::get_video(&app.pool, video).await.unwrap().unwrap();
    assert!(stored.metadata.custom_status.is_none());

    let admin_token = app.session(&admin).await;
    let (status, body) = app
        .send(test_request(
            "PATCH",
            &uri,
            Some(&admin_token),
            Some(json!({"metadata": {"customStatus": "completed"}})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["effectiveStatus"], "completed");
}

#[tokio::test]
async fn test_patch_requires_access_to_video() {
    let app = TestApp::new().await;
    let content_reviewer = app.user("cr", Role::ContentReviewer).await;
    let project = app.project().await;
    let video = app.video(project, "Tablas dinámicas").await;

    let token = app.session(&content_reviewer).await;
    let (status, _) = app
        .send(test_request(
            "PATCH",
            &format!("/api/projects/{}/videos/{}", project, video),
            Some(&token),
            Some(json!({"title": "Renombrado"})),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stored = videos::get_video(&app.pool, video).await.unwrap().unwrap();
    assert_eq!(stored.title, "Tablas dinámicas");
}

#[tokio::test]
async fn test_youtuber_cannot_patch_upload_held_by_another() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let first = app.user("yt1", Role::Youtuber).await;
    let second = app.user("yt2", Role::Youtuber).await;
    let admin_token = app.session(&admin).await;
    let project = app.project().await;
    let video = app.video(project, "Gráficos en Excel").await;
    move_to_upload_review(&app, &admin_token, project, video).await;

    let first_token = app.session(&first).await;
    let (status, _) = app
        .send(test_request(
            "POST",
            &format!("/api/projects/{}/videos/{}/claim", project, video),
            Some(&first_token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let second_token = app.session(&second).await;
    let (status, _) = app
        .send(test_request(
            "PATCH",
            &format!("/api/projects/{}/videos/{}", project, video),
            Some(&second_token),
            Some(json!({"videoUrl": "https://cdn.example.com/otro.mp4"})),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stored = videos::get_video(&app.pool, video).await.unwrap().unwrap();
    assert_eq!(stored.current_reviewer_id, Some(first.id));
    assert!(stored.video_url.is_none());
}

#[tokio::test]
async fn test_trashed_video_cannot_be_edited_or_claimed() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let optimizer = app.user("opt", Role::Optimizer).await;
    let admin_token = app.session(&admin).await;
    let project = app.project().await;
    let video = app.video(project, "Macros en Word").await;
    let uri = format!("/api/projects/{}/videos/{}", project, video);

    let (status, _) = app.send(test_request("DELETE", &uri, Some(&admin_token), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(test_request("PATCH", &uri, Some(&admin_token), Some(json!({"title": "Nuevo"}))))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let token = app.session(&optimizer).await;
    let (status, _) = app
        .send(test_request("POST", &format!("{}/claim", uri), Some(&token), None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let stored = videos::get_video(&app.pool, video).await.unwrap().unwrap();
    assert!(stored.is_deleted);
    assert_eq!(stored.status, VideoStatus::Pending);
    assert_eq!(stored.title, "Macros en Word");

    let (status, body) = app
        .send(test_request("DELETE", &format!("{}?permanent=true", uri), Some(&admin_token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted"], 1);
    assert!(videos::get_video(&app.pool, video).await.unwrap().is_none());
}

#[tokio::test]
async fn test_bulk_create_assigns_series_numbers() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let token = app.session(&admin).await;
    let project = app.project().await;

    let (status, body) = app
        .send(test_request(
            "POST",
            &format!("/api/projects/{}/videos/bulk", project),
            Some(&token),
            Some(json!({"titles": ["Uno", "  ", "Dos"]})),
        ))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["created"], 2);
    assert_eq!(body["data"]["videos"][0]["seriesNumber"], "TUT-0001");
    assert_eq!(body["data"]["videos"][1]["seriesNumber"], "TUT-0002");
}

#[tokio::test]
async fn test_non_admin_cannot_create_videos() {
    let app = TestApp::new().await;
    let optimizer = app.user("opt", Role::Optimizer).await;
    let token = app.session(&optimizer).await;
    let project = app.project().await;

    let (status, _) = app
        .send(test_request(
            "POST",
            &format!("/api/projects/{}/videos", project),
            Some(&token),
            Some(json!({"title": "No permitido"})),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// =============================================================================
// CSV export
// =============================================================================

#[tokio::test]
async fn test_video_export_has_bom_and_one_row_per_video() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let token = app.session(&admin).await;
    let project = app.project().await;
    app.video(project, "Primero").await;
    app.video(project, "Segundo; con separador").await;

    let response = app
        .router()
        .oneshot(test_request("GET", "/api/videos/export.csv", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/csv"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with('\u{feff}'));
    assert_eq!(text.lines().filter(|l| !l.is_empty()).count(), 3);
    assert!(text.contains("\"Segundo; con separador\""));
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_notification_lifecycle() {
    let app = TestApp::new().await;
    let user = app.user("rev", Role::Reviewer).await;
    let other = app.user("otro", Role::Reviewer).await;
    let token = app.session(&user).await;

    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/notifications",
            Some(&token),
            Some(json!({"title": "Recordatorio", "message": "Revisar títulos", "type": "info"})),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(test_request(
            "POST",
            "/api/notifications",
            Some(&token),
            Some(json!({"userId": other.id, "title": "Hola", "message": "Mensaje"})),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .send(test_request("GET", "/api/notifications", Some(&token), None))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(test_request(
            "POST",
            &format!("/api/notifications/{}/read", id),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send(test_request("GET", "/api/notifications", Some(&token), None))
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app
        .send(test_request(
            "GET",
            "/api/notifications?includeRead=true",
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(body["data"][0]["isRead"], true);

    // Someone else's notification cannot be marked
    let other_token = app.session(&other).await;
    let (status, _) = app
        .send(test_request(
            "POST",
            &format!("/api/notifications/{}/read", id),
            Some(&other_token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_role_broadcast_excludes_sender() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    app.user("admin2", Role::Admin).await;
    app.user("yt1", Role::Youtuber).await;
    app.user("yt2", Role::Youtuber).await;
    let token = app.session(&admin).await;

    let notice = json!({"title": "Aviso", "message": "Nuevas reglas de subida"});
    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/notifications/role/youtuber",
            Some(&token),
            Some(notice.clone()),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sent"], 2);

    let (_, body) = app
        .send(test_request(
            "POST",
            "/api/notifications/role/admin",
            Some(&token),
            Some(notice.clone()),
        ))
        .await;
    assert_eq!(body["data"]["sent"], 1);

    let (_, body) = app
        .send(test_request("POST", "/api/notifications/role/all", Some(&token), Some(notice.clone())))
        .await;
    assert_eq!(body["data"]["sent"], 5);

    let (status, _) = app
        .send(test_request("POST", "/api/notifications/role/jefe", Some(&token), Some(notice)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_disabled_in_app_notifications_are_skipped() {
    let app = TestApp::new().await;
    let user = app.user("rev", Role::Reviewer).await;
    let token = app.session(&user).await;

    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/notifications/settings",
            Some(&token),
            Some(json!({"inAppEnabled": false})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["inAppEnabled"], false);
    assert_eq!(body["data"]["emailEnabled"], true);

    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/notifications",
            Some(&token),
            Some(json!({"title": "Recordatorio", "message": "No llega"})),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"].is_null());
}

// =============================================================================
// Affiliates
// =============================================================================

#[tokio::test]
async fn test_affiliate_mention_notifies_claiming_youtuber() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let youtuber = app.user("yt", Role::Youtuber).await;
    let admin_token = app.session(&admin).await;
    let project = app.project().await;

    let (status, _) = app
        .send(test_request(
            "POST",
            "/api/affiliates/companies",
            Some(&admin_token),
            Some(json!({
                "name": "Notion",
                "affiliateUrl": "https://notion.so/ref/vidflow",
                "keywords": ["notion ai"]
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(test_request(
            "POST",
            &format!("/api/projects/{}/videos", project),
            Some(&admin_token),
            Some(json!({"title": "Organiza tu semana con Notion"})),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let video = body["data"]["id"].as_i64().unwrap();

    let (_, body) = app
        .send(test_request(
            "GET",
            &format!("/api/affiliates/videos/{}/matches", video),
            Some(&admin_token),
            None,
        ))
        .await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["notified"], false);
    let match_id = body["data"][0]["id"].as_i64().unwrap();

    move_to_upload_review(&app, &admin_token, project, video).await;
    let token = app.session(&youtuber).await;
    let (status, _) = app
        .send(test_request(
            "POST",
            &format!("/api/projects/{}/videos/{}/claim", project, video),
            Some(&token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app
        .send(test_request("GET", "/api/notifications", Some(&token), None))
        .await;
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Enlace de afiliado requerido");
    assert_eq!(list[0]["relatedEntityId"], video);

    let inclusion = format!("/api/affiliates/matches/{}/inclusion", match_id);
    let (status, _) = app
        .send(test_request("PUT", &inclusion, Some(&token), Some(json!({"included": "yes"}))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(test_request("PUT", &inclusion, Some(&token), Some(json!({"included": true}))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["includedByYoutuber"], true);
    assert_eq!(body["data"]["notified"], true);
}

#[tokio::test]
async fn test_duplicate_company_conflicts() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let token = app.session(&admin).await;
    let company = json!({"name": "Canva", "affiliateUrl": "https://canva.com/ref"});

    let (status, _) = app
        .send(test_request("POST", "/api/affiliates/companies", Some(&token), Some(company.clone())))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .send(test_request("POST", "/api/affiliates/companies", Some(&token), Some(company)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_cannot_change_own_role() {
    let app = TestApp::new().await;
    let user = app.user("rev", Role::Reviewer).await;
    let token = app.session(&user).await;
    let uri = format!("/api/users/{}", user.id);

    let (status, _) = app
        .send(test_request("PATCH", &uri, Some(&token), Some(json!({"role": "admin"}))))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(test_request("PATCH", &uri, Some(&token), Some(json!({"fullName": "Rita Revisora"}))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fullName"], "Rita Revisora");
    assert_eq!(body["data"]["role"], "reviewer");
}

#[tokio::test]
async fn test_limits_must_be_positive() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let youtuber = app.user("yt", Role::Youtuber).await;
    let token = app.session(&admin).await;
    let uri = format!("/api/users/{}/limits", youtuber.id);

    let (status, _) = app
        .send(test_request("PUT", &uri, Some(&token), Some(json!({"maxAssignedVideos": 0}))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(test_request(
            "PUT",
            &uri,
            Some(&token),
            Some(json!({"maxAssignedVideos": 5, "maxMonthlyVideos": 40})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["maxAssignedVideos"], 5);
    assert_eq!(body["data"]["maxMonthlyVideos"], 40);
}

// =============================================================================
// Suggestions
// =============================================================================

#[tokio::test]
async fn test_suggestion_review_flow() {
    let app = TestApp::new().await;
    let admin = app.user("admin", Role::Admin).await;
    let user = app.user("opt", Role::Optimizer).await;
    let admin_token = app.session(&admin).await;
    let token = app.session(&user).await;

    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/suggestions",
            Some(&token),
            Some(json!({
                "title": "Modo oscuro",
                "description": "Añadir un tema oscuro al panel",
                "category": "interfaz"
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = app.send(test_request("GET", "/api/suggestions", Some(&token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = app
        .send(test_request("GET", "/api/suggestions/categories", Some(&token), None))
        .await;
    assert!(body["data"].as_array().unwrap().contains(&json!("interfaz")));

    let (status, body) = app
        .send(test_request(
            "PATCH",
            &format!("/api/suggestions/{}/status", id),
            Some(&admin_token),
            Some(json!({"status": "implemented", "adminNotes": "Disponible en la próxima versión"})),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "implemented");

    let (_, body) = app
        .send(test_request("GET", "/api/suggestions/user", Some(&token), None))
        .await;
    assert_eq!(body["data"][0]["adminNotes"], "Disponible en la próxima versión");
}

// =============================================================================
// Titulin analysis
// =============================================================================

/// Embeds every title to the same fixed vector
struct FixedEmbedding(Vec<f32>);

#[async_trait]
impl EmbeddingProvider for FixedEmbedding {
    async fn embed(&self, _text: &str) -> vidflow_common::Result<Vec<f32>> {
        Ok(self.0.clone())
    }
}

struct CannedClassifier;

#[async_trait]
impl TitleClassifier for CannedClassifier {
    async fn classify(&self, prompt: &str) -> vidflow_common::Result<Classification> {
        assert!(prompt.contains("Noticias de hoy"));
        Ok(Classification {
            is_evergreen: false,
            confidence: 0.64,
            reason: "Depende de la actualidad".to_string(),
        })
    }
}

async fn seed_evergreen_examples(pool: &SqlitePool) {
    let vectors = [[1.0, 0.0], [0.99, 0.1], [0.97, 0.2]];
    for (i, vector) in vectors.iter().enumerate() {
        let example =
            titulin::create_training_example(pool, &format!("Tutorial {}", i), true, None, None)
                .await
                .unwrap();
        titulin::store_example_embedding(pool, example.id, vector).await.unwrap();
    }
}

#[tokio::test]
async fn test_title_analysis_decided_by_vote() {
    let mut app = TestApp::new().await;
    seed_evergreen_examples(&app.pool).await;
    app.state = app.state.clone().with_analysis(
        Arc::new(FixedEmbedding(vec![1.0, 0.05])),
        Arc::new(CannedClassifier),
    );
    let user = app.user("opt", Role::Optimizer).await;
    let token = app.session(&user).await;

    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/titulin/analyze",
            Some(&token),
            Some(json!({"title": "Cómo hacer tablas dinámicas"})),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], "vote");
    assert_eq!(body["data"]["isEvergreen"], true);
    assert_eq!(body["data"]["confidence"], 1.0);
    assert_eq!(body["data"]["similarTitles"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_title_analysis_falls_back_to_classifier() {
    let mut app = TestApp::new().await;
    seed_evergreen_examples(&app.pool).await;
    app.state = app.state.clone().with_analysis(
        Arc::new(FixedEmbedding(vec![0.0, 1.0])),
        Arc::new(CannedClassifier),
    );
    let user = app.user("opt", Role::Optimizer).await;
    let token = app.session(&user).await;

    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/titulin/analyze",
            Some(&token),
            Some(json!({"title": "Noticias de hoy"})),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], "classifier");
    assert_eq!(body["data"]["isEvergreen"], false);
    assert_eq!(body["data"]["reason"], "Depende de la actualidad");
}

#[tokio::test]
async fn test_analysis_without_service_is_bad_gateway() {
    let app = TestApp::new().await;
    let user = app.user("opt", Role::Optimizer).await;
    let token = app.session(&user).await;

    let (status, body) = app
        .send(test_request(
            "POST",
            "/api/titulin/analyze",
            Some(&token),
            Some(json!({"title": "Cualquier cosa"})),
        ))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
}
