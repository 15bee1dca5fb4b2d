//! vidflow-server library - HTTP and WebSocket service
//!
//! Session-authenticated REST API over the video workflow engine, the
//! notification hub, and the Titulin harvesting module.

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod notify;
pub mod pagination;
pub mod services;

use notify::NotificationHub;
use services::{
    DisabledAnalysis, DisabledYoutube, EmbeddingProvider, TitleClassifier, YoutubeClient,
};

/// Default session lifetime
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Live notification connections
    pub hub: NotificationHub,
    pub youtube: Arc<dyn YoutubeClient>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub classifier: Arc<dyn TitleClassifier>,
    /// Lifetime of a login session
    pub session_ttl: chrono::Duration,
}

impl AppState {
    /// State with external services disabled
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            hub: NotificationHub::new(),
            youtube: Arc::new(DisabledYoutube),
            embeddings: Arc::new(DisabledAnalysis),
            classifier: Arc::new(DisabledAnalysis),
            session_ttl: chrono::Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        }
    }

    pub fn with_youtube(mut self, youtube: Arc<dyn YoutubeClient>) -> Self {
        self.youtube = youtube;
        self
    }

    pub fn with_analysis(
        mut self,
        embeddings: Arc<dyn EmbeddingProvider>,
        classifier: Arc<dyn TitleClassifier>,
    ) -> Self {
        self.embeddings = embeddings;
        self.classifier = classifier;
        self
    }

    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

/// Build application router
///
/// `/health` and `/api/login` are public; everything else requires a
/// session cookie.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, patch, post, put};

    let protected = Router::new()
        // Session
        .route("/api/logout", post(api::logout))
        .route("/api/user", get(api::current_user))
        // Videos across projects
        .route("/api/videos", get(api::list_all_videos))
        .route("/api/videos/export.csv", get(api::export_videos))
        // Projects
        .route("/api/projects", get(api::list_projects).post(api::create_project))
        .route(
            "/api/projects/:project_id",
            patch(api::update_project).delete(api::delete_project),
        )
        .route(
            "/api/projects/:project_id/videos",
            get(api::list_project_videos)
                .post(api::create_video)
                .delete(api::bulk_delete_videos),
        )
        .route("/api/projects/:project_id/videos/bulk", post(api::bulk_create_videos))
        .route(
            "/api/projects/:project_id/videos/:video_id",
            get(api::get_video)
                .patch(api::update_video)
                .delete(api::delete_video),
        )
        .route("/api/projects/:project_id/videos/:video_id/claim", post(api::claim_video))
        .route("/api/projects/:project_id/videos/:video_id/restore", post(api::restore_video))
        .route("/api/projects/:project_id/trash", delete(api::empty_trash))
        // Users
        .route("/api/users", get(api::list_users).post(api::create_user))
        .route("/api/users/:user_id", patch(api::update_user).delete(api::delete_user))
        .route("/api/users/:user_id/limits", put(api::update_user_limits))
        .route(
            "/api/users/:user_id/projects",
            get(api::get_project_access).put(api::set_project_access),
        )
        .route("/api/youtuber/video-limits", get(api::youtuber_video_limits))
        // Notifications
        .route(
            "/api/notifications",
            get(api::list_notifications).post(api::create_notification),
        )
        .route("/api/notifications/read-all", post(api::mark_all_read))
        .route(
            "/api/notifications/settings",
            get(api::get_notification_settings).post(api::save_notification_settings),
        )
        .route("/api/notifications/role/:role", post(api::notify_role))
        .route("/api/notifications/:id", delete(api::delete_notification))
        .route("/api/notifications/:id/read", post(api::mark_read))
        .route("/api/notifications/:id/archive", post(api::archive_notification))
        .route("/api/ws/notifications", get(api::notifications_ws))
        // Affiliates
        .route(
            "/api/affiliates/companies",
            get(api::list_companies).post(api::create_company),
        )
        .route("/api/affiliates/companies/import", post(api::import_companies))
        .route("/api/affiliates/companies/export", get(api::export_companies))
        .route(
            "/api/affiliates/companies/:id",
            put(api::update_company).delete(api::delete_company),
        )
        .route("/api/affiliates/videos/:video_id/matches", get(api::video_matches))
        .route("/api/affiliates/matches/:match_id/inclusion", put(api::update_inclusion))
        // Titulin
        .route("/api/titulin/channels", get(api::list_channels).post(api::add_channel))
        .route("/api/titulin/channels/:id", delete(api::delete_channel))
        .route("/api/titulin/channels/:id/sync", post(api::sync_channel))
        .route("/api/titulin/videos", get(api::list_titulin_videos))
        .route("/api/titulin/videos/stats", get(api::titulin_stats))
        .route("/api/titulin/videos/:id/analyze", post(api::analyze_video))
        .route("/api/titulin/videos/:id/similar", get(api::similar_videos))
        .route("/api/titulin/videos/:id/send-to-optimize", post(api::send_to_optimize))
        .route("/api/titulin/analyze", post(api::analyze_title))
        .route(
            "/api/titulin/training-examples",
            get(api::list_training_examples).post(api::create_training_example),
        )
        .route("/api/titulin/training-examples/bulk", post(api::bulk_training_examples))
        .route("/api/titulin/training-examples/export", get(api::export_training_examples))
        .route("/api/titulin/training-examples/import", post(api::import_training_examples))
        .route(
            "/api/titulin/training-examples/process-vectors",
            post(api::process_training_vectors),
        )
        .route("/api/titulin/training-examples/category", put(api::set_examples_category))
        .route("/api/titulin/training-examples/:id", delete(api::delete_training_example))
        // Suggestions
        .route(
            "/api/suggestions",
            get(api::list_suggestions).post(api::create_suggestion),
        )
        .route("/api/suggestions/user", get(api::list_user_suggestions))
        .route("/api/suggestions/categories", get(api::suggestion_categories))
        .route("/api/suggestions/:id/status", patch(api::update_suggestion_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/login", post(api::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
