//! HTTP API handlers
//!
//! Every JSON response uses the `{success, data}` envelope; failures are
//! rendered by [`ApiError`].

use axum::Json;
use serde::Serialize;

pub mod affiliates;
pub mod auth;
pub mod error;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod suggestions;
pub mod titulin;
pub mod users;
pub mod videos;
pub mod ws;

pub use affiliates::{
    create_company, delete_company, export_companies, import_companies, list_companies,
    update_company, update_inclusion, video_matches,
};
pub use auth::{auth_middleware, current_user, login, logout, CurrentUser};
pub use error::ApiError;
pub use health::health_routes;
pub use notifications::{
    archive_notification, create_notification, delete_notification, get_notification_settings,
    list_notifications, mark_all_read, mark_read, notify_role, save_notification_settings,
};
pub use projects::{create_project, delete_project, list_projects, update_project};
pub use suggestions::{
    create_suggestion, list_suggestions, list_user_suggestions, suggestion_categories,
    update_suggestion_status,
};
pub use titulin::{
    add_channel, analyze_title, analyze_video, bulk_training_examples, create_training_example,
    delete_channel, delete_training_example, export_training_examples, import_training_examples,
    list_channels, list_titulin_videos, list_training_examples, process_training_vectors,
    send_to_optimize, set_examples_category, similar_videos, sync_channel, titulin_stats,
};
pub use users::{
    create_user, delete_user, get_project_access, list_users, set_project_access, update_user,
    update_user_limits, youtuber_video_limits,
};
pub use videos::{
    bulk_create_videos, bulk_delete_videos, claim_video, create_video, delete_video, empty_trash,
    export_videos, get_video, list_all_videos, list_project_videos, restore_video, update_video,
};
pub use ws::notifications_ws;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> {
    Json(Envelope { success: true, data })
}
