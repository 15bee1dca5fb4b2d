//! Project endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use vidflow_common::db::projects::{self, ProjectInput};
use vidflow_common::db::users;
use vidflow_common::models::Project;

use super::{ok, ApiError, CurrentUser, Envelope};
use crate::AppState;

/// GET /api/projects
///
/// Admins see every project. Other users see their access list, or every
/// project while that list is empty.
pub async fn list_projects(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Envelope<Vec<Project>>>, ApiError> {
    let access = if user.role.is_admin() {
        Vec::new()
    } else {
        users::project_access(&state.db, user.id).await?
    };

    let ids = (!access.is_empty()).then_some(access.as_slice());
    Ok(ok(projects::list_projects(&state.db, ids).await?))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<ProjectInput>,
) -> Result<(StatusCode, Json<Envelope<Project>>), ApiError> {
    user.require_admin()?;
    let project = projects::create_project(&state.db, &input).await?;
    info!("Project '{}' created by '{}'", project.name, user.username);
    Ok((StatusCode::CREATED, ok(project)))
}

/// PATCH /api/projects/:project_id
pub async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<Envelope<Project>>, ApiError> {
    user.require_admin()?;
    Ok(ok(projects::update_project(&state.db, project_id, &input).await?))
}

/// DELETE /api/projects/:project_id
pub async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<Json<Envelope<()>>, ApiError> {
    user.require_admin()?;
    projects::delete_project(&state.db, project_id).await?;
    info!("Project {} deleted by '{}'", project_id, user.username);
    Ok(ok(()))
}
