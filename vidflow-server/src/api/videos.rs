//! Video handlers
//!
//! Listings are resolved per viewer: every video carries the status and
//! assignee its reader's role perceives. Status changes go through the
//! workflow orchestrator, so an illegal transition never reaches storage.

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use vidflow_common::db::{init::get_setting_i64, projects, users, videos};
use vidflow_common::db::videos::NewVideo;
use vidflow_common::export::export_videos_csv;
use vidflow_common::models::{Actor, Video, VideoLimits};
use vidflow_common::workflow::{
    allowed_transitions, apply_update, can_edit_video, can_revert_state, can_see_details,
    can_unassign_video, can_view_video, effective_assignment, effective_status, previous_state, Assignment,
    EffectiveStatus, Role, VideoListFilter, VideoPatch, VideoStatus,
};

use super::users::month_start;
use super::{ok, ApiError, CurrentUser, Envelope};
use crate::notify;
use crate::AppState;

/// Default for the `bulk_create_max_titles` setting
const DEFAULT_BULK_MAX_TITLES: i64 = 50;

/// A video as one viewer perceives it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    #[serde(flatten)]
    pub video: Video,
    pub effective_status: EffectiveStatus,
    pub effective_status_label: String,
    pub effective_assignment: Assignment,
    pub can_see_details: bool,
    /// Statuses the viewer may move the video to
    pub allowed_transitions: Vec<VideoStatus>,
    /// Target of a one-step revert, when the viewer may revert
    pub revert_to: Option<VideoStatus>,
    pub can_unassign: bool,
}

impl VideoView {
    pub fn new(video: Video, viewer: &Actor) -> Self {
        let status = effective_status(&video, viewer.role, viewer);
        Self {
            effective_status_label: status.label_for(viewer.role).to_string(),
            effective_assignment: effective_assignment(&video, viewer.role, viewer),
            can_see_details: can_see_details(viewer.role, video.status),
            allowed_transitions: allowed_transitions(viewer.role, video.status).to_vec(),
            revert_to: previous_state(video.status)
                .filter(|_| can_revert_state(viewer.role, video.status)),
            can_unassign: can_unassign_video(viewer.role, video.status),
            effective_status: status,
            video,
        }
    }
}

fn views(videos: Vec<Video>, viewer: &Actor) -> Vec<VideoView> {
    videos.into_iter().map(|v| VideoView::new(v, viewer)).collect()
}

async fn visible_videos(state: &AppState, filter: &VideoListFilter, viewer: &Actor) -> Result<Vec<Video>, ApiError> {
    Ok(videos::list_videos(&state.db, None, false)
        .await?
        .into_iter()
        .filter(|v| filter.matches(v, viewer))
        .collect())
}

/// GET /api/videos
pub async fn list_all_videos(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<VideoListFilter>,
) -> Result<Json<Envelope<Vec<VideoView>>>, ApiError> {
    let viewer = user.actor();
    let videos = visible_videos(&state, &filter, &viewer).await?;
    Ok(ok(views(videos, &viewer)))
}

/// GET /api/videos/export.csv
pub async fn export_videos(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(filter): Query<VideoListFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = user.actor();
    let videos = visible_videos(&state, &filter, &viewer).await?;
    let csv = export_videos_csv(&videos, &viewer)?;

    info!("User '{}' exported {} videos", viewer.username, videos.len());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"videos.csv\""),
        ],
        csv,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct TrashQuery {
    #[serde(default)]
    pub trash: Option<bool>,
}

/// GET /api/projects/:project_id/videos[?trash=true]
pub async fn list_project_videos(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
    Query(trash): Query<TrashQuery>,
    Query(filter): Query<VideoListFilter>,
) -> Result<Json<Envelope<Vec<VideoView>>>, ApiError> {
    projects::require_project(&state.db, project_id).await?;
    let viewer = user.actor();

    let trash = trash.trash.unwrap_or(false);
    if trash {
        user.require_admin()?;
    }

    let videos: Vec<Video> = videos::list_videos(&state.db, Some(project_id), trash)
        .await?
        .into_iter()
        .filter(|v| trash || filter.matches(v, &viewer))
        .collect();
    Ok(ok(views(videos, &viewer)))
}

/// GET /api/projects/:project_id/videos/:video_id
pub async fn get_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, video_id)): Path<(i64, i64)>,
) -> Result<Json<Envelope<VideoView>>, ApiError> {
    let video = videos::require_project_video(&state.db, project_id, video_id).await?;
    let viewer = user.actor();
    if !can_view_video(&video, &viewer) {
        return Err(ApiError::forbidden("No tienes acceso a este video"));
    }
    Ok(ok(VideoView::new(video, &viewer)))
}

/// PATCH /api/projects/:project_id/videos/:video_id
pub async fn update_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, video_id)): Path<(i64, i64)>,
    Json(patch): Json<VideoPatch>,
) -> Result<Json<Envelope<VideoView>>, ApiError> {
    let video = videos::require_project_video(&state.db, project_id, video_id).await?;
    let actor = user.actor();
    if !can_edit_video(&video, &actor) {
        return Err(ApiError::forbidden("No tienes permiso para editar este video"));
    }

    let plan = apply_update(&actor, &video, patch, Utc::now())?;
    let saved = videos::save_video(&state.db, &plan.video).await?;

    if let Some((from, to)) = plan.transition {
        info!("Video {} moved {} → {} by '{}'", saved.id, from, to, actor.username);
    }
    if plan.title_changed {
        notify::scan_affiliates(&state.db, &state.hub, &saved).await;
    }

    Ok(ok(VideoView::new(saved, &actor)))
}

/// POST /api/projects/:project_id/videos/:video_id/claim
///
/// Optimizers and admins take pending work; youtubers take an unclaimed
/// upload, within their limits.
pub async fn claim_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, video_id)): Path<(i64, i64)>,
) -> Result<Json<Envelope<VideoView>>, ApiError> {
    let video = videos::require_project_video(&state.db, project_id, video_id).await?;
    let actor = user.actor();

    let saved = match (actor.role, video.status) {
        (Role::Optimizer | Role::Admin, VideoStatus::Pending) => {
            let patch = VideoPatch {
                status: Some(VideoStatus::InProgress),
                ..VideoPatch::default()
            };
            let plan = apply_update(&actor, &video, patch, Utc::now())?;
            videos::save_video(&state.db, &plan.video).await?
        }
        (Role::Youtuber, VideoStatus::UploadReview) => {
            if video.current_reviewer_id == Some(actor.id) {
                return Ok(ok(VideoView::new(video, &actor)));
            }
            if let Some(holder) = video.current_reviewer_id {
                let held_by_youtuber = users::get_user(&state.db, holder)
                    .await?
                    .is_some_and(|u| u.role == Role::Youtuber);
                if held_by_youtuber {
                    return Err(ApiError::Conflict(
                        "El video ya fue tomado por otro youtuber".into(),
                    ));
                }
            }

            let now = Utc::now();
            let limits = VideoLimits::compute(
                &user,
                videos::count_assigned_uploads(&state.db, actor.id).await?,
                videos::count_completed_uploads_since(&state.db, actor.id, month_start(now)).await?,
            );
            if !limits.can_take_more {
                return Err(ApiError::forbidden(if limits.reached_monthly_limit {
                    "Has alcanzado tu límite mensual de videos"
                } else {
                    "Has alcanzado el máximo de videos asignados"
                }));
            }

            if !videos::claim_upload(&state.db, video.id, actor.id, now).await? {
                return Err(ApiError::Conflict(
                    "El video ya fue tomado por otro youtuber".into(),
                ));
            }
            let saved = videos::require_project_video(&state.db, project_id, video_id).await?;
            notify::pending_affiliate_mentions(&state.db, &state.hub, &saved).await?;
            saved
        }
        _ => {
            return Err(ApiError::bad_request(
                "El video no se puede tomar en su estado actual",
            ))
        }
    };

    info!("Video {} claimed by '{}'", saved.id, actor.username);
    Ok(ok(VideoView::new(saved, &actor)))
}

/// POST /api/projects/:project_id/videos
pub async fn create_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
    Json(body): Json<NewVideo>,
) -> Result<(StatusCode, Json<Envelope<VideoView>>), ApiError> {
    user.require_admin()?;
    projects::require_project(&state.db, project_id).await?;

    let video = videos::create_video(&state.db, project_id, &body, Some(user.id)).await?;
    notify::scan_affiliates(&state.db, &state.hub, &video).await;

    info!("Created video {} in project {}", video.id, project_id);
    Ok((StatusCode::CREATED, ok(VideoView::new(video, &user.actor()))))
}

#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    pub titles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkCreated {
    pub created: usize,
    pub videos: Vec<VideoView>,
}

/// POST /api/projects/:project_id/videos/bulk
pub async fn bulk_create_videos(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
    Json(body): Json<BulkCreateRequest>,
) -> Result<(StatusCode, Json<Envelope<BulkCreated>>), ApiError> {
    user.require_admin()?;
    projects::require_project(&state.db, project_id).await?;

    let max_titles = get_setting_i64(&state.db, "bulk_create_max_titles", DEFAULT_BULK_MAX_TITLES).await?;
    let created = videos::bulk_create_videos(
        &state.db,
        project_id,
        &body.titles,
        max_titles.max(1) as usize,
        Some(user.id),
    )
    .await?;

    for video in &created {
        notify::scan_affiliates(&state.db, &state.hub, video).await;
    }

    info!("Bulk created {} videos in project {}", created.len(), project_id);
    let viewer = user.actor();
    Ok((
        StatusCode::CREATED,
        ok(BulkCreated {
            created: created.len(),
            videos: views(created, &viewer),
        }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub permanent: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub deleted: u64,
}

/// DELETE /api/projects/:project_id/videos/:video_id[?permanent=true]
///
/// Moving to the trash is open to admins and the video's creator;
/// permanent deletion is admin-only.
pub async fn delete_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, video_id)): Path<(i64, i64)>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Envelope<Deleted>>, ApiError> {
    let permanent = query.permanent.unwrap_or(false);
    let video = if permanent {
        videos::require_project_video_with_trash(&state.db, project_id, video_id).await?
    } else {
        videos::require_project_video(&state.db, project_id, video_id).await?
    };

    if permanent || video.created_by != Some(user.id) {
        user.require_admin()?;
    }

    let deleted = videos::delete_videos(&state.db, project_id, &[video_id], permanent, user.id).await?;
    info!(
        "Video {} {} by '{}'",
        video_id,
        if permanent { "deleted" } else { "moved to trash" },
        user.username
    );
    Ok(ok(Deleted { deleted }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub video_ids: Vec<i64>,
    #[serde(default)]
    pub permanent: bool,
}

/// DELETE /api/projects/:project_id/videos
pub async fn bulk_delete_videos(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
    Json(body): Json<BulkDeleteRequest>,
) -> Result<Json<Envelope<Deleted>>, ApiError> {
    user.require_admin()?;
    if body.video_ids.is_empty() {
        return Err(ApiError::bad_request("Se requiere al menos un video"));
    }

    let deleted =
        videos::delete_videos(&state.db, project_id, &body.video_ids, body.permanent, user.id).await?;
    info!("Bulk deleted {} videos in project {}", deleted, project_id);
    Ok(ok(Deleted { deleted }))
}

/// POST /api/projects/:project_id/videos/:video_id/restore
pub async fn restore_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((project_id, video_id)): Path<(i64, i64)>,
) -> Result<Json<Envelope<VideoView>>, ApiError> {
    user.require_admin()?;
    let video = videos::restore_video(&state.db, project_id, video_id).await?;
    Ok(ok(VideoView::new(video, &user.actor())))
}

/// DELETE /api/projects/:project_id/trash
pub async fn empty_trash(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
) -> Result<Json<Envelope<Deleted>>, ApiError> {
    user.require_admin()?;
    let deleted = videos::empty_trash(&state.db, project_id).await?;
    info!("Emptied trash of project {} ({} videos)", project_id, deleted);
    Ok(ok(Deleted { deleted }))
}
