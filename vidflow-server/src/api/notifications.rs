//! Notification REST endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use vidflow_common::db::{init::get_setting_i64, notifications};
use vidflow_common::models::{NewNotification, Notification, NotificationSettings};
use vidflow_common::workflow::Role;

use super::{ok, ApiError, CurrentUser, Envelope};
use crate::notify;
use crate::AppState;

/// Hard cap on a single listing
const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub include_read: bool,
    pub limit: Option<i64>,
}

/// GET /api/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<Notification>>>, ApiError> {
    let limit = match query.limit {
        Some(limit) => limit.clamp(1, MAX_LIST_LIMIT),
        None => get_setting_i64(&state.db, "notification_list_limit", 50).await?,
    };
    let list = notifications::list_notifications(&state.db, user.id, query.include_read, limit).await?;
    Ok(ok(list))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    /// Recipient; the caller when absent
    pub user_id: Option<i64>,
    #[serde(flatten)]
    pub notification: NewNotification,
}

/// POST /api/notifications
///
/// Users may notify themselves; notifying someone else requires admin.
/// `data` is `null` when the recipient disabled in-app notifications.
pub async fn create_notification(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateRequest>,
) -> Result<(StatusCode, Json<Envelope<Option<Notification>>>), ApiError> {
    let recipient = body.user_id.unwrap_or(user.id);
    if recipient != user.id && !user.role.is_admin() {
        return Err(ApiError::forbidden(
            "Solo puedes crear notificaciones para ti mismo",
        ));
    }

    let created =
        notify::notify_user(&state.db, &state.hub, recipient, &body.notification, Some(user.id)).await?;
    Ok((StatusCode::CREATED, ok(created)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub sent: usize,
}

/// POST /api/notifications/role/:role
///
/// `all` reaches every user; any other value must name a role, whose
/// members are notified except the sender.
pub async fn notify_role(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(role): Path<String>,
    Json(notification): Json<NewNotification>,
) -> Result<Json<Envelope<Broadcast>>, ApiError> {
    user.require_admin()?;

    let sent = if role == "all" {
        notify::notify_all(&state.db, &state.hub, &notification, Some(user.id)).await?
    } else {
        let role: Role = role.parse()?;
        notify::notify_role(&state.db, &state.hub, role, &notification, Some(user.id)).await?
    };

    info!("'{}' broadcast '{}' to {} users", user.username, notification.title, sent);
    Ok(ok(Broadcast { sent }))
}

/// POST /api/notifications/:id/read
pub async fn mark_read(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if !notifications::mark_read(&state.db, user.id, id).await? {
        return Err(ApiError::not_found("Notificación no encontrada"));
    }
    Ok(ok(()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Updated {
    pub updated: u64,
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Envelope<Updated>>, ApiError> {
    let updated = notifications::mark_all_read(&state.db, user.id).await?;
    Ok(ok(Updated { updated }))
}

/// POST /api/notifications/:id/archive
pub async fn archive_notification(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    if !notifications::archive(&state.db, user.id, id).await? {
        return Err(ApiError::not_found("Notificación no encontrada"));
    }
    Ok(ok(()))
}

/// DELETE /api/notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    user.require_admin()?;
    notifications::delete_notification(&state.db, id).await?;
    Ok(ok(()))
}

/// GET /api/notifications/settings
pub async fn get_notification_settings(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Envelope<NotificationSettings>>, ApiError> {
    Ok(ok(notifications::get_settings(&state.db, user.id).await?))
}

/// POST /api/notifications/settings
pub async fn save_notification_settings(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(settings): Json<NotificationSettings>,
) -> Result<Json<Envelope<NotificationSettings>>, ApiError> {
    Ok(ok(notifications::save_settings(&state.db, user.id, &settings).await?))
}
