//! Which videos each role may list and open

use super::effective::{effective_status, EffectiveStatus};
use super::{Role, VideoStatus};
use crate::models::{Actor, Video};

/// Effective-status strings a role sees in the video listing
pub fn visible_states(role: Role) -> &'static [&'static str] {
    match role {
        Role::Optimizer => &[
            "pending",
            "disponible",
            "in_progress",
            "optimize_review",
            "title_corrections",
            "en_revision",
        ],
        Role::Youtuber => &["video_disponible", "asignado", "youtube_ready", "completed"],
        Role::Reviewer => &[
            "optimize_review",
            "title_corrections",
            "upload_review",
            "video_disponible",
            "completed",
            "en_revision",
        ],
        Role::Admin => &[
            "pending",
            "in_progress",
            "optimize_review",
            "title_corrections",
            "upload_review",
            "media_corrections",
            "review",
            "youtube_ready",
            "completed",
            "en_revision",
        ],
        Role::ContentReviewer | Role::MediaReviewer => &[],
    }
}

/// Whether `viewer` may see `video` in listings
pub fn can_view_video(video: &Video, viewer: &Actor) -> bool {
    let role = viewer.role;
    if role.is_admin() {
        return true;
    }

    let effective = effective_status(video, role, viewer);

    if role == Role::Reviewer
        && (matches!(
            video.status,
            VideoStatus::OptimizeReview | VideoStatus::TitleCorrections
        ) || effective == EffectiveStatus::Raw(VideoStatus::OptimizeReview))
    {
        return true;
    }

    if role == Role::Optimizer {
        let optimization = video.metadata.optimization.as_ref();
        let assigned_to_viewer = video.current_reviewer_id == Some(viewer.id)
            || optimization
                .and_then(|o| o.assigned_to.as_ref())
                .is_some_and(|a| a.user_id == viewer.id);

        if video.status == VideoStatus::Pending {
            return true;
        }
        if optimization
            .and_then(|o| o.reviewed_by.as_ref())
            .is_some_and(|r| r.approved)
        {
            return true;
        }
        if assigned_to_viewer
            && matches!(
                effective,
                EffectiveStatus::Raw(VideoStatus::EnRevision)
                    | EffectiveStatus::Raw(VideoStatus::OptimizeReview)
            )
        {
            return true;
        }
    }

    visible_states(role).contains(&effective.as_str())
}

/// Whether `viewer` may edit `video`
///
/// Editing needs visibility. A youtuber also cannot touch an upload held by
/// someone else.
pub fn can_edit_video(video: &Video, viewer: &Actor) -> bool {
    if !can_view_video(video, viewer) {
        return false;
    }
    !(viewer.role == Role::Youtuber
        && video.status == VideoStatus::UploadReview
        && video.current_reviewer_id.is_some_and(|id| id != viewer.id))
}

/// Whether `role` may open the detail view of a video in `status`
pub fn can_see_details(role: Role, status: VideoStatus) -> bool {
    use VideoStatus::*;
    match role {
        Role::Admin => true,
        Role::Optimizer => matches!(status, Pending | InProgress | TitleCorrections | Completed),
        Role::Reviewer => matches!(status, OptimizeReview | UploadReview | Review | Completed),
        Role::ContentReviewer => matches!(status, OptimizeReview | Completed),
        Role::MediaReviewer => matches!(status, Review | Completed),
        Role::Youtuber => matches!(status, UploadReview | MediaCorrections | Review | Completed),
    }
}
