//! User management and youtuber limits

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use vidflow_common::db::users::{self, NewUser, UserUpdate};
use vidflow_common::db::videos;
use vidflow_common::models::{User, VideoLimits};
use vidflow_common::workflow::Role;

use super::auth::hash_password;
use super::{ok, ApiError, CurrentUser, Envelope};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 6;

/// First instant of the month containing `now` (UTC)
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

fn check_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "La contraseña debe tener al menos {} caracteres",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn check_limit(name: &str, value: Option<i64>) -> Result<(), ApiError> {
    match value {
        Some(v) if v < 1 => Err(ApiError::bad_request(format!(
            "{} debe ser un número entero positivo",
            name
        ))),
        _ => Ok(()),
    }
}

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Envelope<Vec<User>>>, ApiError> {
    user.require_admin()?;
    Ok(ok(users::list_users(&state.db).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub max_assigned_videos: Option<i64>,
    #[serde(default)]
    pub max_monthly_videos: Option<i64>,
    #[serde(default)]
    pub project_ids: Vec<i64>,
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Envelope<User>>), ApiError> {
    user.require_admin()?;

    let username = body.username.trim();
    if username.chars().count() < 3 {
        return Err(ApiError::bad_request(
            "El nombre de usuario debe tener al menos 3 caracteres",
        ));
    }
    check_password(&body.password)?;
    check_limit("maxAssignedVideos", body.max_assigned_videos)?;
    check_limit("maxMonthlyVideos", body.max_monthly_videos)?;

    let created = users::create_user(
        &state.db,
        &NewUser {
            username: username.to_string(),
            password_hash: hash_password(&body.password)?,
            full_name: body.full_name,
            email: body.email,
            role: body.role,
            max_assigned_videos: body.max_assigned_videos,
            max_monthly_videos: body.max_monthly_videos,
        },
    )
    .await?;

    if !body.project_ids.is_empty() {
        users::set_project_access(&state.db, created.id, &body.project_ids).await?;
    }

    info!("Created user '{}' ({})", created.username, created.role);
    Ok((StatusCode::CREATED, ok(created)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub password: Option<String>,
}

/// PATCH /api/users/:user_id
///
/// Admins edit anyone; other users only their own profile, never their role.
pub async fn update_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<Envelope<User>>, ApiError> {
    let is_admin = user.role.is_admin();
    if !is_admin && user.id != user_id {
        return Err(ApiError::forbidden("Solo puedes editar tu propio perfil"));
    }
    if !is_admin && body.role.is_some_and(|r| r != user.role) {
        return Err(ApiError::forbidden("No puedes cambiar tu propio rol"));
    }

    let password_hash = match body.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => {
            check_password(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let update = UserUpdate {
        full_name: body.full_name,
        email: body.email,
        role: body.role,
        password_hash,
    };
    let updated = users::update_user(&state.db, user_id, &update).await?;

    info!("User '{}' updated by '{}'", updated.username, user.username);
    Ok(ok(updated))
}

/// DELETE /api/users/:user_id
pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    user.require_admin()?;
    if user.id == user_id {
        return Err(ApiError::bad_request("No puedes eliminar tu propia cuenta"));
    }

    users::delete_user(&state.db, user_id).await?;
    info!("User {} deleted by '{}'", user_id, user.username);
    Ok(ok(()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsRequest {
    #[serde(default)]
    pub max_assigned_videos: Option<i64>,
    #[serde(default)]
    pub max_monthly_videos: Option<i64>,
}

/// PUT /api/users/:user_id/limits
pub async fn update_user_limits(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
    Json(body): Json<LimitsRequest>,
) -> Result<Json<Envelope<User>>, ApiError> {
    user.require_admin()?;
    if body.max_assigned_videos.is_none() && body.max_monthly_videos.is_none() {
        return Err(ApiError::bad_request("No se indicó ningún límite"));
    }
    check_limit("maxAssignedVideos", body.max_assigned_videos)?;
    check_limit("maxMonthlyVideos", body.max_monthly_videos)?;

    let updated =
        users::update_limits(&state.db, user_id, body.max_assigned_videos, body.max_monthly_videos).await?;
    Ok(ok(updated))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAccess {
    pub project_ids: Vec<i64>,
}

/// GET /api/users/:user_id/projects
pub async fn get_project_access(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Envelope<ProjectAccess>>, ApiError> {
    if user.id != user_id {
        user.require_admin()?;
    }
    let project_ids = users::project_access(&state.db, user_id).await?;
    Ok(ok(ProjectAccess { project_ids }))
}

/// PUT /api/users/:user_id/projects
pub async fn set_project_access(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i64>,
    Json(body): Json<ProjectAccess>,
) -> Result<Json<Envelope<ProjectAccess>>, ApiError> {
    user.require_admin()?;
    users::set_project_access(&state.db, user_id, &body.project_ids).await?;
    let project_ids = users::project_access(&state.db, user_id).await?;
    Ok(ok(ProjectAccess { project_ids }))
}

/// GET /api/youtuber/video-limits
pub async fn youtuber_video_limits(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Envelope<VideoLimits>>, ApiError> {
    if !matches!(user.role, Role::Youtuber | Role::Admin) {
        return Err(ApiError::forbidden("Solo disponible para youtubers"));
    }

    let assigned = videos::count_assigned_uploads(&state.db, user.id).await?;
    let monthly = videos::count_completed_uploads_since(&state.db, user.id, month_start(Utc::now())).await?;
    Ok(ok(VideoLimits::compute(&user, assigned, monthly)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 17, 15, 42, 9).unwrap();
        assert_eq!(month_start(now), Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_limits_must_be_positive() {
        assert!(check_limit("x", None).is_ok());
        assert!(check_limit("x", Some(5)).is_ok());
        assert!(check_limit("x", Some(0)).is_err());
        assert!(check_limit("x", Some(-2)).is_err());
    }
}
